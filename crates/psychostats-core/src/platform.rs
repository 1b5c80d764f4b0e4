//! Spreadsheet platforms a student can work on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PsychoError;

/// The software environment lessons are tailored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Desktop Excel on Windows.
    Windows,
    /// Desktop Excel on macOS.
    Mac,
    /// Excel mobile app on Android or iPad.
    Tablet,
    /// Excel Online in a browser.
    Web,
}

impl Platform {
    /// All platforms in display order.
    pub const ALL: [Self; 4] = [Self::Windows, Self::Mac, Self::Tablet, Self::Web];

    /// Stored name, also used in prompts.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::Mac => "Mac",
            Self::Tablet => "Tablet",
            Self::Web => "Web",
        }
    }

    /// Label shown on the selection screen.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::Mac => "Mac OS",
            Self::Tablet => "Tablet",
            Self::Web => "Excel Online",
        }
    }

    /// One-line description shown under the label.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Windows => "Versión de Escritorio Estándar",
            Self::Mac => "Computadoras Apple",
            Self::Tablet => "Android o iPad (App Móvil)",
            Self::Web => "Navegador Web (Office 365)",
        }
    }

    /// Instruction appended to lesson prompts so menus and shortcuts match
    /// what the student sees.
    #[must_use]
    pub const fn prompt_hint(self) -> &'static str {
        match self {
            Self::Windows => {
                "El estudiante usa Excel para Windows (versión de escritorio). Describe las rutas de la cinta de opciones (ej. Inicio > Formato) y usa atajos con Ctrl."
            }
            Self::Mac => {
                "El estudiante usa Excel para Mac. Usa atajos con Cmd (⌘) en lugar de Ctrl y menciona la barra de menús superior cuando sea distinta de Windows."
            }
            Self::Tablet => {
                "El estudiante usa la app de Excel en una tablet (Android o iPad). Describe gestos táctiles (tocar, mantener presionado, arrastrar los controladores) y no uses atajos de teclado."
            }
            Self::Web => {
                "El estudiante usa Excel Online en el navegador (Office 365). Usa solo funciones disponibles en la versión web y avisa si algo requiere la versión de escritorio."
            }
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = PsychoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "windows" | "win" => Ok(Self::Windows),
            "mac" | "macos" | "mac os" | "osx" => Ok(Self::Mac),
            "tablet" | "ipad" | "android" => Ok(Self::Tablet),
            "web" | "online" | "excel online" => Ok(Self::Web),
            _ => Err(PsychoError::invalid_platform(s)),
        }
    }
}
