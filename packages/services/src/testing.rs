use std::sync::Mutex;

use dbx_demo_client::{
    ClusterDirectory, ClusterEntity, Error, FileDirectory, FileEntity, GroupEntity, QueryCriteria,
    UserDirectory, UserEntity,
};
use futures::{StreamExt as _, stream::BoxStream};

use crate::Reporter;

type Items<T> = Vec<Result<T, String>>;

/// In-memory directory. `Err` entries become a 500 from the remote side
/// at that position in the stream.
#[derive(Default)]
pub struct FakeDirectory {
    pub users: Items<UserEntity>,
    pub groups: Items<GroupEntity>,
    pub clusters: Items<ClusterEntity>,
    pub files: Items<FileEntity>,
    pub user_queries: Mutex<Vec<QueryCriteria>>,
    pub file_paths: Mutex<Vec<String>>,
}

impl FakeDirectory {
    pub fn user_queries(&self) -> Vec<QueryCriteria> {
        self.user_queries.lock().unwrap().clone()
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.file_paths.lock().unwrap().clone()
    }
}

fn stream<T: Clone + Send + 'static>(items: &Items<T>) -> BoxStream<'static, Result<T, Error>> {
    futures::stream::iter(items.clone().into_iter().map(|item| {
        item.map_err(|message| Error::RequestFailed {
            status: 500,
            message,
        })
    }))
    .boxed()
}

impl UserDirectory for FakeDirectory {
    fn list_users(&self, criteria: QueryCriteria) -> BoxStream<'_, Result<UserEntity, Error>> {
        self.user_queries.lock().unwrap().push(criteria);
        stream(&self.users)
    }

    fn list_groups(&self) -> BoxStream<'_, Result<GroupEntity, Error>> {
        stream(&self.groups)
    }
}

impl ClusterDirectory for FakeDirectory {
    fn list_clusters(&self) -> BoxStream<'_, Result<ClusterEntity, Error>> {
        stream(&self.clusters)
    }
}

impl FileDirectory for FakeDirectory {
    fn list_files(&self, path: &str) -> BoxStream<'_, Result<FileEntity, Error>> {
        self.file_paths.lock().unwrap().push(path.to_string());
        stream(&self.files)
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

pub fn failure(message: &str) -> String {
    message.to_string()
}

pub fn user(id: &str, user_name: &str) -> UserEntity {
    UserEntity {
        id: id.to_string(),
        user_name: user_name.to_string(),
        display_name: None,
        active: Some(true),
    }
}

pub fn group(display_name: &str) -> GroupEntity {
    GroupEntity {
        id: None,
        display_name: display_name.to_string(),
    }
}

pub fn cluster(cluster_name: &str) -> ClusterEntity {
    ClusterEntity {
        cluster_id: format!("{cluster_name}-id"),
        cluster_name: cluster_name.to_string(),
        state: Some("RUNNING".to_string()),
        spark_version: None,
    }
}

pub fn file(path: &str) -> FileEntity {
    FileEntity {
        path: path.to_string(),
        is_dir: false,
        file_size: 0,
        modification_time: None,
    }
}
