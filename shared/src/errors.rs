//! Error types for user input
//!
//! The `Display` output of these errors is shown to the user verbatim when
//! the bot asks them to try again, so the messages are written for chat.

use thiserror::Error;

/// Invalid category or choice selection
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    #[error("选项不能为空，请重新输入")]
    Empty,

    #[error("选项不正确，请重新输入")]
    Invalid,
}

/// Invalid free-form input for a check-in
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("内容不能为空，请重新输入")]
    Empty,

    #[error("请输入正确的数字")]
    NotANumber,
}
