//! Callback and action names shared with the native host

// Callbacks the host invokes on the card.
pub const CB_MOBILE_LOGIN: &str = "mobileLogin";
pub const CB_GET_NEW_ACCESS_TOKEN: &str = "getNewAccessToken";
pub const CB_SET_LOADING: &str = "setLoading";
pub const CB_MOBILE_LOGOUT: &str = "mobileLogout";
pub const CB_ON_AUTH_ERROR: &str = "onAuthError";

// Actions the card asks the host to perform.
pub const ACTION_ACQUIRE_MOBILE_TOKEN: &str = "acquireMobileToken";
pub const ACTION_USER_SIGN_IN: &str = "userSignIn";
pub const ACTION_USER_SIGN_OUT: &str = "userSignOut";
