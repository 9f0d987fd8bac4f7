//! Barcode scanner surface on the batch list screen.
//!
//! The camera itself is the platform's business. Rust only tracks whether
//! the surface is open and whether the camera may be used; a decoded scan
//! arrives through [`LoteList::on_scan_detected`](crate::list::LoteList::on_scan_detected).

use serde::{Deserialize, Serialize};

/// Camera permission as last reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPermission {
    /// Not asked yet, or the answer has not arrived.
    #[default]
    Unknown,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scanner {
    open: bool,
    permission: CameraPermission,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn permission(&self) -> CameraPermission {
        self.permission
    }

    /// The camera view is shown only when open and permitted.
    pub fn is_active(&self) -> bool {
        self.open && self.permission == CameraPermission::Granted
    }

    pub fn set_permission(&mut self, granted: bool) {
        self.permission = if granted {
            CameraPermission::Granted
        } else {
            CameraPermission::Denied
        };
        if !granted {
            self.open = false;
        }
    }

    /// Flip the surface. Opening without a granted permission is refused
    /// and returns `false`.
    pub fn toggle(&mut self) -> bool {
        if self.open {
            self.open = false;
            return true;
        }
        if self.permission != CameraPermission::Granted {
            return false;
        }
        self.open = true;
        true
    }

    pub fn close(&mut self) {
        self.open = false;
    }
}
