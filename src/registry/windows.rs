//! winreg-backed registry reads.

use std::io;

use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE};
use winreg::RegKey;

use super::{split_value_path, Hive, RegistryError};

pub(super) fn read_value(hive: Hive, path: &str) -> Result<String, RegistryError> {
    let (key_path, value_name) = split_value_path(path);

    let root = RegKey::predef(match hive {
        Hive::LocalMachine => HKEY_LOCAL_MACHINE,
        Hive::CurrentUser => HKEY_CURRENT_USER,
    });

    let key = root.open_subkey(key_path).map_err(classify)?;
    key.get_value::<String, _>(value_name).map_err(classify)
}

fn classify(err: io::Error) -> RegistryError {
    if err.kind() == io::ErrorKind::NotFound {
        RegistryError::NotFound
    } else {
        RegistryError::Unreadable(err.to_string())
    }
}
