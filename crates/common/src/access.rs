//! Access control: a global privilege gate in front of every operation,
//! plus per-entity owner/reader/writer lists.
//!
//! The two layers are independent. Privileges answer "may this principal
//! perform this *class* of operation at all"; the entity ACL answers "on
//! this particular document". Both must pass, and the privilege check
//! runs first so an unauthorized caller never touches the store.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Group whose members bypass entity ACL checks.
pub const ADMIN_GROUP: &str = "admin";

/// Operation classes gated globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privilege {
    CreateProduct,
    ReadProduct,
    UpdateProduct,
    DeleteProduct,
    ConfirmProduct,
    CreateCollection,
    ReadCollection,
    UpdateCollection,
    DeleteCollection,
    CreateRelationship,
    DeleteRelationship,
    Search,
}

impl Privilege {
    pub fn all() -> [Privilege; 12] {
        [
            Privilege::CreateProduct,
            Privilege::ReadProduct,
            Privilege::UpdateProduct,
            Privilege::DeleteProduct,
            Privilege::ConfirmProduct,
            Privilege::CreateCollection,
            Privilege::ReadCollection,
            Privilege::UpdateCollection,
            Privilege::DeleteCollection,
            Privilege::CreateRelationship,
            Privilege::DeleteRelationship,
            Privilege::Search,
        ]
    }
}

impl std::fmt::Display for Privilege {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // the serde snake_case name
        let s = match self {
            Privilege::CreateProduct => "create_product",
            Privilege::ReadProduct => "read_product",
            Privilege::UpdateProduct => "update_product",
            Privilege::DeleteProduct => "delete_product",
            Privilege::ConfirmProduct => "confirm_product",
            Privilege::CreateCollection => "create_collection",
            Privilege::ReadCollection => "read_collection",
            Privilege::UpdateCollection => "update_collection",
            Privilege::DeleteCollection => "delete_collection",
            Privilege::CreateRelationship => "create_relationship",
            Privilege::DeleteRelationship => "delete_relationship",
            Privilege::Search => "search",
        };
        f.write_str(s)
    }
}

/// An authenticated caller: a name plus the groups the token resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,
    pub groups: Vec<String>,
}

impl Principal {
    pub fn new(name: impl Into<String>, groups: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.groups.iter().any(|g| g == ADMIN_GROUP)
    }
}

/// Group → privilege grants, loaded from server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Grants {
    #[serde(default)]
    groups: HashMap<String, HashSet<Privilege>>,
}

impl Grants {
    /// Everyone in `users` may do everything. Dev servers and tests.
    pub fn permissive() -> Self {
        let mut grants = Self::default();
        grants.grant("users", Privilege::all());
        grants
    }

    pub fn grant(&mut self, group: impl Into<String>, privileges: impl IntoIterator<Item = Privilege>) {
        self.groups
            .entry(group.into())
            .or_default()
            .extend(privileges);
    }

    pub fn allows(&self, principal: &Principal, privilege: Privilege) -> bool {
        if principal.is_admin() {
            return true;
        }
        principal.groups.iter().any(|g| {
            self.groups
                .get(g)
                .map(|set| set.contains(&privilege))
                .unwrap_or(false)
        })
    }
}

/// Whether reads consult entity ACLs or only the global privilege gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadPolicy {
    /// Anyone holding the read privilege may read any entity.
    #[default]
    World,
    /// Reads additionally require ACL membership.
    Acl,
}

/// Documents carrying an owner/reader/writer ACL.
pub trait Protected {
    fn owner(&self) -> &str;
    fn readers(&self) -> &[String];
    fn writers(&self) -> &[String];

    fn is_reader(&self, principal: &Principal) -> bool {
        self.is_writer(principal) || self.readers().iter().any(|r| r == &principal.name)
    }

    fn is_writer(&self, principal: &Principal) -> bool {
        self.owner() == principal.name || self.writers().iter().any(|w| w == &principal.name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("{principal} lacks the {privilege} privilege")]
    MissingPrivilege {
        principal: String,
        privilege: Privilege,
    },
    #[error("{principal} is not authorized to {action} this entity")]
    Denied {
        principal: String,
        action: &'static str,
    },
}

pub fn ensure_privilege(
    grants: &Grants,
    principal: &Principal,
    privilege: Privilege,
) -> Result<(), AccessError> {
    if grants.allows(principal, privilege) {
        Ok(())
    } else {
        Err(AccessError::MissingPrivilege {
            principal: principal.name.clone(),
            privilege,
        })
    }
}

pub fn ensure_read(
    policy: ReadPolicy,
    principal: &Principal,
    doc: &impl Protected,
) -> Result<(), AccessError> {
    match policy {
        ReadPolicy::World => Ok(()),
        ReadPolicy::Acl => {
            if principal.is_admin() || doc.is_reader(principal) {
                Ok(())
            } else {
                Err(AccessError::Denied {
                    principal: principal.name.clone(),
                    action: "read",
                })
            }
        }
    }
}

pub fn ensure_write(principal: &Principal, doc: &impl Protected) -> Result<(), AccessError> {
    if principal.is_admin() || doc.is_writer(principal) {
        Ok(())
    } else {
        Err(AccessError::Denied {
            principal: principal.name.clone(),
            action: "write",
        })
    }
}

pub fn ensure_owner(principal: &Principal, doc: &impl Protected) -> Result<(), AccessError> {
    if principal.is_admin() || doc.owner() == principal.name {
        Ok(())
    } else {
        Err(AccessError::Denied {
            principal: principal.name.clone(),
            action: "administer",
        })
    }
}

/// Lookup seam for "does this user exist", used when ownership changes
/// hands. Principal *resolution* is the server's problem; the service
/// layer only ever asks this one question.
pub trait PrincipalDirectory: Send + Sync {
    fn exists(&self, name: &str) -> bool;
}

/// Directory backed by a fixed user list, or wide open for dev setups.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: HashSet<String>,
    open: bool,
}

impl StaticDirectory {
    pub fn from_users(users: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            users: users.into_iter().map(Into::into).collect(),
            open: false,
        }
    }

    /// A directory that recognizes every name.
    pub fn open() -> Self {
        Self {
            users: HashSet::new(),
            open: true,
        }
    }
}

impl PrincipalDirectory for StaticDirectory {
    fn exists(&self, name: &str) -> bool {
        self.open || self.users.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doc {
        owner: String,
        readers: Vec<String>,
        writers: Vec<String>,
    }

    impl Protected for Doc {
        fn owner(&self) -> &str {
            &self.owner
        }
        fn readers(&self) -> &[String] {
            &self.readers
        }
        fn writers(&self) -> &[String] {
            &self.writers
        }
    }

    fn doc() -> Doc {
        Doc {
            owner: "ada".into(),
            readers: vec!["rita".into()],
            writers: vec!["walt".into()],
        }
    }

    #[test]
    fn privilege_gate() {
        let grants = Grants::permissive();
        let member = Principal::new("ada", ["users"]);
        let outsider = Principal::new("eve", ["guests"]);

        assert!(ensure_privilege(&grants, &member, Privilege::CreateProduct).is_ok());
        assert!(ensure_privilege(&grants, &outsider, Privilege::CreateProduct).is_err());
    }

    #[test]
    fn admin_bypasses_everything() {
        let grants = Grants::default();
        let root = Principal::new("root", [ADMIN_GROUP]);

        assert!(ensure_privilege(&grants, &root, Privilege::DeleteProduct).is_ok());
        assert!(ensure_owner(&root, &doc()).is_ok());
    }

    #[test]
    fn acl_read_policy() {
        let doc = doc();
        let reader = Principal::new("rita", ["users"]);
        let stranger = Principal::new("sam", ["users"]);

        assert!(ensure_read(ReadPolicy::World, &stranger, &doc).is_ok());
        assert!(ensure_read(ReadPolicy::Acl, &reader, &doc).is_ok());
        assert!(ensure_read(ReadPolicy::Acl, &stranger, &doc).is_err());
    }

    #[test]
    fn writers_are_readers_but_not_owners() {
        let doc = doc();
        let writer = Principal::new("walt", ["users"]);

        assert!(ensure_read(ReadPolicy::Acl, &writer, &doc).is_ok());
        assert!(ensure_write(&writer, &doc).is_ok());
        assert!(ensure_owner(&writer, &doc).is_err());
        assert!(ensure_owner(&Principal::new("ada", ["users"]), &doc).is_ok());
    }

    #[test]
    fn static_directory() {
        let fixed = StaticDirectory::from_users(["ada", "walt"]);
        assert!(fixed.exists("ada"));
        assert!(!fixed.exists("eve"));
        assert!(StaticDirectory::open().exists("anyone"));
    }
}
