use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitReportError>;

#[derive(Error, Debug)]
pub enum GitReportError {
    #[error("Git repository error: {0}")]
    GitRepo(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Conversion failed: {0}")]
    Conversion(String),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("Reference find error: {0}")]
    RefFind(#[from] Box<gix::reference::find::existing::Error>),
    #[error("Object find with conversion error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Object decode error: {0}")]
    ObjectDecode(#[from] Box<gix::objs::decode::Error>),
    #[error("Diff tree to tree error: {0}")]
    DiffTreeToTree(#[from] Box<gix::repository::diff_tree_to_tree::Error>),
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
}

// gix errors are boxed in the enum, convert from the unboxed forms here
impl From<gix::object::find::existing::Error> for GitReportError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        GitReportError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for GitReportError {
    fn from(err: gix::object::commit::Error) -> Self {
        GitReportError::Commit(Box::new(err))
    }
}

impl From<gix::reference::find::existing::Error> for GitReportError {
    fn from(err: gix::reference::find::existing::Error) -> Self {
        GitReportError::RefFind(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for GitReportError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        GitReportError::ObjectFindConv(Box::new(err))
    }
}

impl From<gix::objs::decode::Error> for GitReportError {
    fn from(err: gix::objs::decode::Error) -> Self {
        GitReportError::ObjectDecode(Box::new(err))
    }
}

impl From<gix::repository::diff_tree_to_tree::Error> for GitReportError {
    fn from(err: gix::repository::diff_tree_to_tree::Error) -> Self {
        GitReportError::DiffTreeToTree(Box::new(err))
    }
}

impl From<gix::discover::Error> for GitReportError {
    fn from(err: gix::discover::Error) -> Self {
        GitReportError::GitDiscover(Box::new(err))
    }
}
