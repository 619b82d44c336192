//! 역할 기반 접근 제어 (RBAC).
//!
//! 사용자 역할과 라우트별 허용 역할 목록을 정의합니다.
//! 권한 판단은 역할 계층이 아니라 허용 목록 포함 여부로만 이루어집니다.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// 사용자 역할.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 일반 사용자 - 가입 시 기본 역할
    #[default]
    User,
    /// 관리자
    Admin,
}

impl Role {
    /// 저장소와 토큰에 기록되는 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// 문자열에서 역할 파싱.
    ///
    /// 대소문자를 구분하는 정확한 일치만 허용합니다 (`"Admin"`은 `None`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 라우트에 접근할 수 있는 역할 집합.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedRoles(HashSet<Role>);

impl AllowedRoles {
    /// 허용 역할 목록 생성.
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self(roles.into_iter().collect())
    }

    /// 모든 가입 사용자(user, admin)를 허용합니다.
    pub fn any_user() -> Self {
        Self::new([Role::User, Role::Admin])
    }

    /// 관리자만 허용합니다.
    pub fn admin_only() -> Self {
        Self::new([Role::Admin])
    }

    /// 역할이 허용 목록에 있는지 확인.
    pub fn admits(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_exact() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("Admin"), None);
        assert_eq!(Role::parse(" user"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_default_role() {
        assert_eq!(Role::default(), Role::User);
        assert_eq!(Role::default().to_string(), "user");
    }

    #[test]
    fn test_allowed_roles() {
        let admin_only = AllowedRoles::admin_only();
        assert!(admin_only.admits(Role::Admin));
        assert!(!admin_only.admits(Role::User));

        let any_user = AllowedRoles::any_user();
        assert!(any_user.admits(Role::Admin));
        assert!(any_user.admits(Role::User));

        assert!(!AllowedRoles::new([]).admits(Role::User));
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"admin\"");

        let parsed: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(parsed, Role::User);
    }
}
