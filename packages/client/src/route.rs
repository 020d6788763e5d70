//! Page routes and layout navigation.

use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown page '{0}'")]
pub struct RouteError(pub String);

/// Pages of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Chat,
    Login,
    Signup,
    Profile,
    Community,
}

/// Entry of the layout navigation bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavLink {
    Page(Route),
    Logout,
}

const LOGGED_IN_NAV: [NavLink; 4] = [
    NavLink::Page(Route::Home),
    NavLink::Page(Route::Chat),
    NavLink::Page(Route::Profile),
    NavLink::Logout,
];

const LOGGED_OUT_NAV: [NavLink; 2] = [NavLink::Page(Route::Login), NavLink::Page(Route::Signup)];

impl Route {
    /// Parse a page path such as `/chat`
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        match path.trim() {
            "/" | "/home" => Ok(Route::Home),
            "/chat" => Ok(Route::Chat),
            "/login" => Ok(Route::Login),
            "/signup" => Ok(Route::Signup),
            "/profile" => Ok(Route::Profile),
            "/community" => Ok(Route::Community),
            other => Err(RouteError(other.to_string())),
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/home",
            Route::Chat => "/chat",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Profile => "/profile",
            Route::Community => "/community",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Chat => "Chat",
            Route::Login => "Login",
            Route::Signup => "Signup",
            Route::Profile => "Profile",
            Route::Community => "Community",
        }
    }

    /// The page actually shown: Home sends logged-in users to Chat
    pub fn resolve(self, logged_in: bool) -> Self {
        match self {
            Route::Home if logged_in => Route::Chat,
            other => other,
        }
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::parse(s)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Navigation entries for the layout header
pub fn nav_links(logged_in: bool) -> &'static [NavLink] {
    if logged_in {
        &LOGGED_IN_NAV
    } else {
        &LOGGED_OUT_NAV
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_paths() {
        // テスト項目: 既知のパスがページに変換される
        // given (前提条件) / when (操作) / then (期待する結果):
        assert_eq!(Route::parse("/").unwrap(), Route::Home);
        assert_eq!(Route::parse("/home").unwrap(), Route::Home);
        assert_eq!(Route::parse("/chat").unwrap(), Route::Chat);
        assert_eq!(Route::parse(" /community ").unwrap(), Route::Community);
    }

    #[test]
    fn test_parse_unknown_path_is_rejected() {
        // テスト項目: 未知のパスはエラーになる
        // given (前提条件):
        let path = "/admin";

        // when (操作):
        let result = Route::parse(path);

        // then (期待する結果):
        assert_eq!(result, Err(RouteError("/admin".to_string())));
    }

    #[test]
    fn test_home_redirects_logged_in_user_to_chat() {
        // テスト項目: ログイン済みの場合、Home は Chat にリダイレクトされる
        // given (前提条件) / when (操作) / then (期待する結果):
        assert_eq!(Route::Home.resolve(true), Route::Chat);
        assert_eq!(Route::Home.resolve(false), Route::Home);
        assert_eq!(Route::Profile.resolve(true), Route::Profile);
    }

    #[test]
    fn test_nav_links_depend_on_login_state() {
        // テスト項目: ナビゲーションはログイン状態によって切り替わる
        // given (前提条件) / when (操作):
        let logged_in = nav_links(true);
        let logged_out = nav_links(false);

        // then (期待する結果):
        assert!(logged_in.contains(&NavLink::Logout));
        assert!(logged_in.contains(&NavLink::Page(Route::Chat)));
        assert_eq!(
            logged_out,
            &[NavLink::Page(Route::Login), NavLink::Page(Route::Signup)]
        );
    }
}
