/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles a back-office user can hold
/// Closed set; anything else coming from a token is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    SuperAdmin,
    Admin,
    Operator,
    Finance,
    Driver,
    User,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Operator,
        Role::Finance,
        Role::Driver,
        Role::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "superadmin",
            Role::Admin => "admin",
            Role::Operator => "operator",
            Role::Finance => "finance",
            Role::Driver => "driver",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Protected back-office pages
/// The string id is hierarchical ("administracion.choferes") and the route
/// path mirrors it ("/administracion/choferes")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PageId {
    Dashboard,
    Envios,
    Paquetes,
    Tracking,
    Documentos,
    Reportes,
    AdministracionChoferes,
    AdministracionVehiculos,
    AdministracionRutas,
    AdministracionUsuarios,
    FinanzasDashboard,
    FinanzasFacturacion,
}

impl PageId {
    pub const ALL: [PageId; 12] = [
        PageId::Dashboard,
        PageId::Envios,
        PageId::Paquetes,
        PageId::Tracking,
        PageId::Documentos,
        PageId::Reportes,
        PageId::AdministracionChoferes,
        PageId::AdministracionVehiculos,
        PageId::AdministracionRutas,
        PageId::AdministracionUsuarios,
        PageId::FinanzasDashboard,
        PageId::FinanzasFacturacion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageId::Dashboard => "dashboard",
            PageId::Envios => "envios",
            PageId::Paquetes => "paquetes",
            PageId::Tracking => "tracking",
            PageId::Documentos => "documentos",
            PageId::Reportes => "reportes",
            PageId::AdministracionChoferes => "administracion.choferes",
            PageId::AdministracionVehiculos => "administracion.vehiculos",
            PageId::AdministracionRutas => "administracion.rutas",
            PageId::AdministracionUsuarios => "administracion.usuarios",
            PageId::FinanzasDashboard => "finanzas.dashboard",
            PageId::FinanzasFacturacion => "finanzas.facturacion",
        }
    }

    /// Route path for the page, e.g. "/finanzas/dashboard"
    pub fn path(&self) -> String {
        format!("/{}", self.as_str().replace('.', "/"))
    }

    pub fn title(&self) -> &'static str {
        match self {
            PageId::Dashboard => "Dashboard",
            PageId::Envios => "Envíos",
            PageId::Paquetes => "Paquetes",
            PageId::Tracking => "Seguimiento",
            PageId::Documentos => "Documentos",
            PageId::Reportes => "Reportes",
            PageId::AdministracionChoferes => "Choferes",
            PageId::AdministracionVehiculos => "Vehículos",
            PageId::AdministracionRutas => "Rutas",
            PageId::AdministracionUsuarios => "Usuarios",
            PageId::FinanzasDashboard => "Finanzas",
            PageId::FinanzasFacturacion => "Facturación",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        PageId::ALL.into_iter().find(|page| page.path() == path)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageId::ALL
            .into_iter()
            .find(|page| page.as_str() == s)
            .ok_or_else(|| format!("Unknown page identifier: {}", s))
    }
}
