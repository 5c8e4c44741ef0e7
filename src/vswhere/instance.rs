//! Typed view of one Visual Studio installation reported by vswhere.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::toolset::{releases, MsvcVersion};

/// Product editions, in preference order. When several instances carry the
/// same compiler version, the higher-ranked edition wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edition {
    Enterprise,
    Professional,
    Community,
    BuildTools,
    WdExpress,
}

impl Edition {
    /// Match the last segment of a vswhere `productId`, e.g.
    /// `Microsoft.VisualStudio.Product.Community`.
    pub fn from_product_id(product_id: &str) -> Option<Edition> {
        match product_id.rsplit('.').next() {
            Some("Enterprise") => Some(Edition::Enterprise),
            Some("Professional") => Some(Edition::Professional),
            Some("Community") => Some(Edition::Community),
            Some("BuildTools") => Some(Edition::BuildTools),
            Some("WDExpress") => Some(Edition::WdExpress),
            _ => None,
        }
    }

    pub fn rank(&self) -> u32 {
        match self {
            Edition::Enterprise => 140,
            Edition::Professional => 130,
            Edition::Community => 120,
            Edition::BuildTools => 110,
            Edition::WdExpress => 100,
        }
    }

    /// Suffix appended to the version token. Only Express installs are
    /// distinguished this way.
    pub fn version_suffix(&self) -> &'static str {
        match self {
            Edition::WdExpress => "Exp",
            _ => "",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Edition::Enterprise => "Enterprise",
            Edition::Professional => "Professional",
            Edition::Community => "Community",
            Edition::BuildTools => "BuildTools",
            Edition::WdExpress => "WDExpress",
        }
    }
}

/// One entry of vswhere's JSON output, limited to the fields we consume.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawInstance {
    pub product_id: String,
    pub installation_path: String,
    pub installation_version: String,
    pub is_prerelease: bool,
}

/// A usable compiler installation derived from a [`RawInstance`].
#[derive(Debug, Clone)]
pub struct MsvcInstance {
    /// The `VC` product directory inside the installation.
    pub vc_dir: PathBuf,
    /// Version token including any edition suffix, e.g. `14.1Exp`.
    pub version: String,
    pub numeric: (u32, u32),
    pub is_release: bool,
    pub edition: Edition,
}

impl MsvcInstance {
    /// Validate a raw entry and fold it into the crate's version scheme.
    /// Instances that are incomplete, absent from disk, or from an unknown
    /// product line are dropped.
    pub fn from_raw(raw: &RawInstance) -> Option<MsvcInstance> {
        if raw.product_id.is_empty() {
            debug!("instance has no productId");
            return None;
        }
        if raw.installation_path.is_empty() {
            debug!(product = %raw.product_id, "instance has no installationPath");
            return None;
        }

        let vs_root = PathBuf::from(&raw.installation_path);
        if !vs_root.exists() {
            debug!(path = %vs_root.display(), "installationPath does not exist");
            return None;
        }
        let vc_dir = vs_root.join("VC");
        if !vc_dir.exists() {
            debug!(path = %vc_dir.display(), "installation has no VC directory");
            return None;
        }

        if raw.installation_version.is_empty() {
            debug!(product = %raw.product_id, "instance has no installationVersion");
            return None;
        }
        let vs_major = raw
            .installation_version
            .split('.')
            .next()
            .unwrap_or_default();
        let Some(base_version) = releases::vs_major_to_version(vs_major) else {
            debug!(vs_major, "ignoring unknown installation major version");
            return None;
        };

        let Some(edition) = Edition::from_product_id(&raw.product_id) else {
            debug!(product = %raw.product_id, "ignoring unknown product edition");
            return None;
        };

        let version = format!("{base_version}{}", edition.version_suffix());
        let numeric = MsvcVersion::parse(&version).ok()?.numeric();

        Some(MsvcInstance {
            vc_dir,
            version,
            numeric,
            is_release: !raw.is_prerelease,
            edition,
        })
    }

    /// Ordering key: newer first, release before prerelease, then edition
    /// rank. Callers sort descending on it.
    pub fn sort_key(&self) -> ((u32, u32), bool, u32) {
        (self.numeric, self.is_release, self.edition.rank())
    }
}
