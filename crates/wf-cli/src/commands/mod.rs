//! CLI command implementations

pub(crate) mod history;
pub(crate) mod init;
pub(crate) mod ls;
pub(crate) mod new;
pub(crate) mod node;
pub(crate) mod run;
pub(crate) mod show;
pub(crate) mod source;
