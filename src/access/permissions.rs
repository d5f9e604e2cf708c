use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr;

use crate::types::{PageId, Role};

/// What a page requires from an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "roles", rename_all = "snake_case")]
pub enum AccessRule {
    AnyAuthenticated,
    Roles(BTreeSet<Role>),
    Nobody,
}

impl AccessRule {
    /// An empty role list places no restriction beyond being logged in
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        let roles: BTreeSet<Role> = roles.into_iter().collect();
        if roles.is_empty() {
            AccessRule::AnyAuthenticated
        } else {
            AccessRule::Roles(roles)
        }
    }

    pub fn permits(&self, role: Role) -> bool {
        match self {
            AccessRule::AnyAuthenticated => true,
            AccessRule::Roles(roles) => roles.contains(&role),
            AccessRule::Nobody => false,
        }
    }
}

/// How string keys without a table entry resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnconfiguredPolicy {
    /// Any authenticated role may view the page
    Allow,
    /// Nobody may view the page until it is configured
    Deny,
}

impl FromStr for UnconfiguredPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" | "open" => Ok(UnconfiguredPolicy::Allow),
            "deny" | "closed" => Ok(UnconfiguredPolicy::Deny),
            other => Err(format!("Unknown unconfigured-page policy: {}", other)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    #[error("Failed to read permissions file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid permissions file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Page '{0}' lists no roles; omit it or name at least one role")]
    EmptyRoleSet(String),

    #[error("Page key must not be empty")]
    EmptyKey,
}

/// Builtin roles per page
fn builtin_rule(page: PageId) -> AccessRule {
    use Role::*;

    match page {
        PageId::Dashboard | PageId::Tracking => AccessRule::AnyAuthenticated,
        PageId::Envios => AccessRule::roles([SuperAdmin, Admin, Operator]),
        PageId::Paquetes => AccessRule::roles([SuperAdmin, Admin, Operator, Driver]),
        PageId::Documentos => AccessRule::roles([SuperAdmin, Admin, Operator, Finance]),
        PageId::Reportes => AccessRule::roles([SuperAdmin, Admin, Finance]),
        PageId::AdministracionChoferes | PageId::AdministracionVehiculos => {
            AccessRule::roles([SuperAdmin, Admin])
        }
        PageId::AdministracionRutas => AccessRule::roles([SuperAdmin, Admin, Operator]),
        PageId::AdministracionUsuarios => AccessRule::roles([SuperAdmin]),
        PageId::FinanzasDashboard => AccessRule::roles([SuperAdmin, Admin, Finance]),
        PageId::FinanzasFacturacion => AccessRule::roles([SuperAdmin, Finance]),
    }
}

/// Read-only page → role lookup, built once at startup
#[derive(Debug, Clone)]
pub struct PermissionTable {
    pages: BTreeMap<PageId, AccessRule>,
    extra: BTreeMap<String, AccessRule>,
    unconfigured: UnconfiguredPolicy,
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::builtin(UnconfiguredPolicy::Allow)
    }
}

impl PermissionTable {
    pub fn builtin(unconfigured: UnconfiguredPolicy) -> Self {
        Self {
            pages: PageId::ALL.into_iter().map(|page| (page, builtin_rule(page))).collect(),
            extra: BTreeMap::new(),
            unconfigured,
        }
    }

    /// Apply overrides from YAML: a map of page key to role names
    ///
    /// ```yaml
    /// administracion.choferes: [superadmin, admin, operator]
    /// almacen.inventario: [admin]
    /// ```
    pub fn with_overrides_yaml(mut self, yaml: &str) -> Result<Self, PermissionError> {
        let overrides: BTreeMap<String, Vec<Role>> = serde_yaml::from_str(yaml)?;

        for (key, roles) in overrides {
            let key = key.trim().to_string();
            if key.is_empty() {
                return Err(PermissionError::EmptyKey);
            }
            if roles.is_empty() {
                return Err(PermissionError::EmptyRoleSet(key));
            }

            let rule = AccessRule::roles(roles);
            match key.parse::<PageId>() {
                Ok(page) => {
                    tracing::debug!("Permission override for page '{}'", page);
                    self.pages.insert(page, rule);
                }
                Err(_) => {
                    tracing::debug!("Permission entry for extra page '{}'", key);
                    self.extra.insert(key, rule);
                }
            }
        }

        Ok(self)
    }

    pub fn with_overrides_file(self, path: &Path) -> Result<Self, PermissionError> {
        let yaml = std::fs::read_to_string(path)?;
        self.with_overrides_yaml(&yaml)
    }

    pub fn unconfigured_policy(&self) -> UnconfiguredPolicy {
        self.unconfigured
    }

    /// Typed lookup; every page has a rule
    pub fn rule_for(&self, page: PageId) -> AccessRule {
        self.pages.get(&page).cloned().unwrap_or_else(|| builtin_rule(page))
    }

    /// Lookup by string key, falling back to the unconfigured policy
    pub fn rule_for_key(&self, key: &str) -> AccessRule {
        if let Ok(page) = key.parse::<PageId>() {
            return self.rule_for(page);
        }
        if let Some(rule) = self.extra.get(key) {
            return rule.clone();
        }

        tracing::debug!("No permission entry for '{}', policy {:?}", key, self.unconfigured);
        match self.unconfigured {
            UnconfiguredPolicy::Allow => AccessRule::AnyAuthenticated,
            UnconfiguredPolicy::Deny => AccessRule::Nobody,
        }
    }

    /// Pages a given role may open
    pub fn pages_for(&self, role: Role) -> Vec<PageId> {
        PageId::ALL
            .into_iter()
            .filter(|page| self.rule_for(*page).permits(role))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (String, &AccessRule)> {
        self.pages
            .iter()
            .map(|(page, rule)| (page.as_str().to_string(), rule))
            .chain(self.extra.iter().map(|(key, rule)| (key.clone(), rule)))
    }
}
