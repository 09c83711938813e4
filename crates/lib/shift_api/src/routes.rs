//! Route path constants.

/// POST /api/users/register
pub const POST_API_USERS_REGISTER: &str = "/api/users/register";
/// POST /api/users/login
pub const POST_API_USERS_LOGIN: &str = "/api/users/login";
/// POST /api/users/logout
pub const POST_API_USERS_LOGOUT: &str = "/api/users/logout";
/// POST /api/users/verify-account-request
pub const POST_API_USERS_VERIFY_ACCOUNT_REQUEST: &str = "/api/users/verify-account-request";
/// GET /api/users/verify-account/{token}
pub const GET_API_USERS_VERIFY_ACCOUNT_TOKEN: &str = "/api/users/verify-account/{token}";
/// POST /api/users/change-password-request
pub const POST_API_USERS_CHANGE_PASSWORD_REQUEST: &str = "/api/users/change-password-request";
/// PATCH /api/users/change-password/{token}
pub const PATCH_API_USERS_CHANGE_PASSWORD_TOKEN: &str = "/api/users/change-password/{token}";
/// PATCH /api/users/change-password
pub const PATCH_API_USERS_CHANGE_PASSWORD: &str = "/api/users/change-password";
/// POST /api/users/reactivate-request
pub const POST_API_USERS_REACTIVATE_REQUEST: &str = "/api/users/reactivate-request";
/// GET /api/users/reactivate-account/{token}
pub const GET_API_USERS_REACTIVATE_ACCOUNT_TOKEN: &str = "/api/users/reactivate-account/{token}";
/// GET /api/users/profile
pub const GET_API_USERS_PROFILE: &str = "/api/users/profile";
/// PATCH /api/users/update-profile
pub const PATCH_API_USERS_UPDATE_PROFILE: &str = "/api/users/update-profile";
/// PATCH /api/users/avatar
pub const PATCH_API_USERS_AVATAR: &str = "/api/users/avatar";
/// PATCH /api/users/soft-delete
pub const PATCH_API_USERS_SOFT_DELETE: &str = "/api/users/soft-delete";

/// POST /api/users/create-user
pub const POST_API_USERS_CREATE_USER: &str = "/api/users/create-user";
/// GET /api/users/get-users
pub const GET_API_USERS_GET_USERS: &str = "/api/users/get-users";
/// GET /api/users/get-users/{userId}
pub const GET_API_USERS_GET_USERS_USERID: &str = "/api/users/get-users/{userId}";
/// PATCH /api/users/update/{userId}
pub const PATCH_API_USERS_UPDATE_USERID: &str = "/api/users/update/{userId}";
/// PATCH /api/users/status/{userId}
pub const PATCH_API_USERS_STATUS_USERID: &str = "/api/users/status/{userId}";
/// PATCH /api/users/soft-delete/{userId}
pub const PATCH_API_USERS_SOFT_DELETE_USERID: &str = "/api/users/soft-delete/{userId}";
/// PATCH /api/users/restore/{userId}
pub const PATCH_API_USERS_RESTORE_USERID: &str = "/api/users/restore/{userId}";
/// DELETE /api/users/{userId}
pub const DELETE_API_USERS_USERID: &str = "/api/users/{userId}";

/// GET /api/entries
pub const GET_API_ENTRIES: &str = "/api/entries";
/// GET /api/entries/mood-stats
pub const GET_API_ENTRIES_MOOD_STATS: &str = "/api/entries/mood-stats";
/// GET /api/entries/entry-stats
pub const GET_API_ENTRIES_ENTRY_STATS: &str = "/api/entries/entry-stats";
/// GET /api/entries/{entryId}
pub const GET_API_ENTRIES_ENTRYID: &str = "/api/entries/{entryId}";
/// POST /api/entries/add
pub const POST_API_ENTRIES_ADD: &str = "/api/entries/add";
/// PATCH /api/entries/update/{entryId}
pub const PATCH_API_ENTRIES_UPDATE_ENTRYID: &str = "/api/entries/update/{entryId}";
/// PATCH /api/entries/soft-delete/{entryId}
pub const PATCH_API_ENTRIES_SOFT_DELETE_ENTRYID: &str = "/api/entries/soft-delete/{entryId}";
/// PATCH /api/entries/restore/{entryId}
pub const PATCH_API_ENTRIES_RESTORE_ENTRYID: &str = "/api/entries/restore/{entryId}";
/// DELETE /api/entries/{entryId}
pub const DELETE_API_ENTRIES_ENTRYID: &str = "/api/entries/{entryId}";

/// GET /api/tags
pub const GET_API_TAGS: &str = "/api/tags";
/// POST /api/tags/add
pub const POST_API_TAGS_ADD: &str = "/api/tags/add";
/// PATCH /api/tags/update/{tagId}
pub const PATCH_API_TAGS_UPDATE_TAGID: &str = "/api/tags/update/{tagId}";
/// DELETE /api/tags/delete/{tagId}
pub const DELETE_API_TAGS_DELETE_TAGID: &str = "/api/tags/delete/{tagId}";
