//! UseCase: セッションコンテキスト
//!
//! ログイン中のユーザーを保持し、全てのビューに注入される共有ハンドル。
//! 永続化は [`SessionStorage`]（`currentUser` / `users` キー）に委譲します。
//!
//! - `restore`: 起動時に `currentUser` を読み込む
//! - `signup` / `login`: ログイン（作成）
//! - `logout`: 全てのクローンから同時に無効化
//!
//! パスワードは扱いません。認証はクライアントの自己申告です。

use std::sync::{Arc, RwLock};

use hiroba_shared::time::{Clock, timestamp_to_rfc3339};

use crate::domain::{
    RegisteredUser, SessionStorage, SessionUser, Timestamp,
    record::{RegisteredUserDto, SessionUserDto},
    session_storage::{CURRENT_USER_KEY, USERS_KEY},
};

use super::error::SessionError;

/// セッションコンテキスト（クローンは同じ状態を共有する）
#[derive(Clone)]
pub struct Session {
    storage: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
    current: Arc<RwLock<Option<SessionUser>>>,
}

impl Session {
    /// ストレージからセッションを復元する
    ///
    /// 壊れた `currentUser` はログアウト状態として扱う。
    pub fn restore(
        storage: Arc<dyn SessionStorage>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SessionError> {
        let current = read_current_user(storage.as_ref())?;
        if let Some(user) = &current {
            tracing::info!("Restored session of '{}'", user.display_name());
        }
        Ok(Self {
            storage,
            clock,
            current: Arc::new(RwLock::new(current)),
        })
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// このプロファイルに登録済みのユーザー一覧
    pub fn registered_users(&self) -> Result<Vec<RegisteredUser>, SessionError> {
        let Some(raw) = self.storage.get_item(USERS_KEY)? else {
            return Ok(Vec::new());
        };
        let users: Vec<RegisteredUserDto> = serde_json::from_str(&raw)?;
        Ok(users.into_iter().map(RegisteredUser::from).collect())
    }

    /// ログイン中のユーザーの登録情報（未ログインなら `None`）
    pub fn current_registration(&self) -> Result<Option<RegisteredUser>, SessionError> {
        let Some(user) = self.current_user() else {
            return Ok(None);
        };
        Ok(self
            .registered_users()?
            .into_iter()
            .find(|registered| registered.email.eq_ignore_ascii_case(&user.email)))
    }

    /// ユーザーを登録してログインする
    ///
    /// # Returns
    ///
    /// * `Ok(SessionUser)` - ログインしたユーザー
    /// * `Err(SessionError::InvalidEmail)` - メールアドレスの形式が不正
    /// * `Err(SessionError::AlreadyRegistered)` - 同じメールアドレスが登録済み
    pub fn signup(&self, username: &str, email: &str) -> Result<SessionUser, SessionError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(SessionError::InvalidEmail(email.to_string()));
        }

        let mut users = self.registered_users()?;
        if users.iter().any(|user| user.email.eq_ignore_ascii_case(email)) {
            return Err(SessionError::AlreadyRegistered(email.to_string()));
        }

        let registered = RegisteredUser {
            username: Some(username.trim().to_string()).filter(|name| !name.is_empty()),
            email: email.to_string(),
            registered_at: Timestamp::new(self.clock.now_millis()),
        };
        users.push(registered.clone());

        let dtos: Vec<RegisteredUserDto> = users.iter().map(RegisteredUserDto::from).collect();
        self.storage
            .set_item(USERS_KEY, &serde_json::to_string(&dtos)?)?;
        tracing::info!(
            "Registered '{}' at {}",
            email,
            timestamp_to_rfc3339(registered.registered_at.value())
        );

        self.enter(registered.to_session_user())
    }

    /// 登録済みユーザー（メールアドレスまたはユーザー名）としてログインする
    pub fn login(&self, identifier: &str) -> Result<SessionUser, SessionError> {
        let user = self
            .registered_users()?
            .into_iter()
            .find(|user| user.matches(identifier))
            .ok_or_else(|| SessionError::UnknownUser(identifier.trim().to_string()))?;
        self.enter(user.to_session_user())
    }

    /// ログアウトする（全てのクローンに即座に反映される）
    pub fn logout(&self) -> Result<(), SessionError> {
        self.storage.remove_item(CURRENT_USER_KEY)?;
        let previous = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(user) = previous {
            tracing::info!("'{}' logged out", user.display_name());
        }
        Ok(())
    }

    /// ストレージを読み直す（外部で変更された場合）
    pub fn reload(&self) -> Result<Option<SessionUser>, SessionError> {
        let current = read_current_user(self.storage.as_ref())?;
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = current.clone();
        Ok(current)
    }

    fn enter(&self, user: SessionUser) -> Result<SessionUser, SessionError> {
        let raw = serde_json::to_string(&SessionUserDto::from(&user))?;
        self.storage.set_item(CURRENT_USER_KEY, &raw)?;
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(user.clone());
        tracing::info!("'{}' logged in", user.display_name());
        Ok(user)
    }
}

fn read_current_user(storage: &dyn SessionStorage) -> Result<Option<SessionUser>, SessionError> {
    let Some(raw) = storage.get_item(CURRENT_USER_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str::<Option<SessionUserDto>>(&raw) {
        Ok(user) => Ok(user.map(SessionUser::from)),
        Err(e) => {
            tracing::warn!("Ignoring unreadable '{}': {}", CURRENT_USER_KEY, e);
            Ok(None)
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::session_storage::InMemorySessionStorage;
    use hiroba_shared::time::ManualClock;

    fn create_session() -> (Session, Arc<InMemorySessionStorage>) {
        let storage = Arc::new(InMemorySessionStorage::new());
        let session = Session::restore(storage.clone(), Arc::new(ManualClock::new(1))).unwrap();
        (session, storage)
    }

    #[test]
    fn test_signup_logs_in_and_persists() {
        // テスト項目: サインアップでユーザーが登録され、ログイン状態になる
        // given (前提条件):
        let (session, storage) = create_session();

        // when (操作):
        let user = session.signup("alice", "alice@example.com").unwrap();

        // then (期待する結果):
        assert_eq!(user.display_name(), "alice");
        assert!(session.is_logged_in());
        assert_eq!(session.registered_users().unwrap().len(), 1);
        let raw = storage.get_item(CURRENT_USER_KEY).unwrap().unwrap();
        assert!(raw.contains("alice@example.com"));
    }

    #[test]
    fn test_signup_rejects_duplicate_and_invalid_email() {
        // テスト項目: 重複したメールアドレスと不正なメールアドレスは拒否される
        // given (前提条件):
        let (session, _storage) = create_session();
        session.signup("alice", "alice@example.com").unwrap();

        // when (操作):
        let duplicate = session.signup("alice2", "ALICE@example.com");
        let invalid = session.signup("bob", "bob.example.com");

        // then (期待する結果):
        assert!(matches!(duplicate, Err(SessionError::AlreadyRegistered(_))));
        assert!(matches!(invalid, Err(SessionError::InvalidEmail(_))));
        assert_eq!(session.registered_users().unwrap().len(), 1);
    }

    #[test]
    fn test_current_registration_follows_login() {
        // テスト項目: ログイン中のユーザーの登録情報が取得でき、ログアウト後は None になる
        // given (前提条件):
        let (session, _) = create_session();
        session.signup("alice", "Alice@Example.com").unwrap();

        // when (操作):
        let registration = session.current_registration().unwrap();
        session.logout().unwrap();

        // then (期待する結果):
        let registration = registration.unwrap();
        assert_eq!(registration.username.as_deref(), Some("alice"));
        assert_eq!(registration.registered_at, Timestamp::new(1));
        assert_eq!(session.current_registration().unwrap(), None);
    }

    #[test]
    fn test_logout_invalidates_every_clone() {
        // テスト項目: ログアウトは全てのクローンに反映される
        // given (前提条件):
        let (session, storage) = create_session();
        session.signup("alice", "alice@example.com").unwrap();
        let view_handle = session.clone();

        // when (操作):
        session.logout().unwrap();

        // then (期待する結果):
        assert!(!view_handle.is_logged_in());
        assert_eq!(storage.get_item(CURRENT_USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_login_by_email_or_username() {
        // テスト項目: メールアドレスまたはユーザー名でログインできる
        // given (前提条件):
        let (session, _storage) = create_session();
        session.signup("alice", "alice@example.com").unwrap();
        session.logout().unwrap();

        // when (操作):
        let by_email = session.login("Alice@Example.com").unwrap();
        session.logout().unwrap();
        let by_name = session.login("alice").unwrap();
        let unknown = session.login("mallory");

        // then (期待する結果):
        assert_eq!(by_email, by_name);
        assert!(matches!(unknown, Err(SessionError::UnknownUser(_))));
    }

    #[test]
    fn test_restore_reads_current_user() {
        // テスト項目: 起動時に保存済みのログインユーザーが復元される
        // given (前提条件):
        let storage = Arc::new(InMemorySessionStorage::new());
        storage
            .set_item(CURRENT_USER_KEY, r#"{"username":"bob","email":"bob@example.com"}"#)
            .unwrap();

        // when (操作):
        let session = Session::restore(storage, Arc::new(ManualClock::new(0))).unwrap();

        // then (期待する結果):
        let user = session.current_user().unwrap();
        assert_eq!(user.username.as_deref(), Some("bob"));
    }

    #[test]
    fn test_restore_ignores_corrupted_current_user() {
        // テスト項目: 壊れた currentUser はログアウト状態として扱われる
        // given (前提条件):
        let storage = Arc::new(InMemorySessionStorage::new());
        storage.set_item(CURRENT_USER_KEY, "{not json").unwrap();

        // when (操作):
        let session = Session::restore(storage, Arc::new(ManualClock::new(0))).unwrap();

        // then (期待する結果):
        assert!(!session.is_logged_in());
    }

    #[test]
    fn test_reload_picks_up_external_changes() {
        // テスト項目: 外部でストレージが変更された場合、reload で反映される
        // given (前提条件):
        let (session, storage) = create_session();
        session.signup("alice", "alice@example.com").unwrap();

        // when (操作):
        storage.remove_item(CURRENT_USER_KEY).unwrap();
        let reloaded = session.reload().unwrap();

        // then (期待する結果):
        assert_eq!(reloaded, None);
        assert!(!session.is_logged_in());
    }
}
