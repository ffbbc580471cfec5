use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    CommentStoreSuccess,
    CommentUpdateSuccess,
    CommentDeleteSuccess,
    CommentViewError,
    CommentsApproveSuccess,
    CommentsDeleteSuccess,
    PageStoreSuccess,
    PageUpdateSuccess,
    PageDeleteSuccess,
    NoComments,
}

/// Source of the user facing strings sent back in response envelopes.
pub trait Messages: Send + Sync {
    fn get(&self, key: MessageKey) -> Cow<'static, str>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct English;

impl Messages for English {
    fn get(&self, key: MessageKey) -> Cow<'static, str> {
        Cow::Borrowed(match key {
            MessageKey::CommentStoreSuccess => "Your comment was successfully created.",
            MessageKey::CommentUpdateSuccess => "Your comment was successfully updated.",
            MessageKey::CommentDeleteSuccess => "Your comment was successfully deleted.",
            MessageKey::CommentViewError => "The post you were viewing has been deleted.",
            MessageKey::CommentsApproveSuccess => "The selected comments were approved.",
            MessageKey::CommentsDeleteSuccess => "The selected comments were deleted.",
            MessageKey::PageStoreSuccess => "Your page has been created successfully.",
            MessageKey::PageUpdateSuccess => "Your page has been updated successfully.",
            MessageKey::PageDeleteSuccess => "Your page has been deleted successfully.",
            MessageKey::NoComments => "There are currently no comments.",
        })
    }
}
