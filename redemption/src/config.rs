use std::path::Path;
use std::str::FromStr;

use crate::storage::driver::s3::S3Config;
use crate::utils::cli::Args;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    S3,
    Filesystem,
    Memory,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "S3" => Ok(StorageKind::S3),
            "FILESYSTEM" => Ok(StorageKind::Filesystem),
            "MEMORY" => Ok(StorageKind::Memory),
            other => Err(format!(
                "REDEEM_STORAGE `{other}` is not one of S3, FILESYSTEM, MEMORY"
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: StorageKind,
    pub bucket: String,
    pub root_dir: String,
    pub key_prefix: String,
    pub s3: S3Config,
    pub conditional_writes: bool,
}

impl Config {
    /// A configuration backed by the in-process store.
    pub fn in_memory() -> Self {
        Config {
            host: "127.0.0.1".into(),
            port: 0,
            storage: StorageKind::Memory,
            bucket: String::new(),
            root_dir: String::new(),
            key_prefix: String::new(),
            s3: S3Config::default(),
            conditional_writes: true,
        }
    }
}

/// Checks the parsed arguments and collects every problem found, so the
/// operator sees all of them at once.
pub fn validate_config(args: &Args) -> Result<Config, Vec<String>> {
    let mut validation_errors = Vec::new();

    let storage = match args.storage.parse::<StorageKind>() {
        Ok(kind) => Some(kind),
        Err(e) => {
            validation_errors.push(e);
            None
        }
    };

    match storage {
        Some(StorageKind::Filesystem) => {
            let root_dir = Path::new(&args.root);
            match std::fs::metadata(root_dir) {
                Ok(meta) if !meta.is_dir() => validation_errors.push(format!(
                    "REDEEM_ROOTDIR `{}` exists but is not a directory",
                    args.root,
                )),
                Ok(_) => {}
                Err(_) => validation_errors
                    .push(format!("REDEEM_ROOTDIR `{}` does not exist.", args.root)),
            }
        }
        Some(StorageKind::S3) if args.bucket.trim().is_empty() => {
            validation_errors.push("REDEEM_BUCKET must not be empty".to_string());
        }
        _ => {}
    }

    if args.key_prefix.starts_with('/') || args.key_prefix.split('/').any(|seg| seg == "..") {
        validation_errors.push(format!(
            "REDEEM_KEY_PREFIX `{}` must be relative and must not contain `..`",
            args.key_prefix,
        ));
    }

    let Some(storage) = storage else {
        return Err(validation_errors);
    };
    if !validation_errors.is_empty() {
        return Err(validation_errors);
    }

    Ok(Config {
        host: args.host.clone(),
        port: args.port,
        storage,
        bucket: args.bucket.clone(),
        root_dir: args.root.clone(),
        key_prefix: args.key_prefix.clone(),
        s3: S3Config {
            endpoint_url: args.s3_endpoint.clone(),
            region: args.s3_region.clone(),
            force_path_style: args.s3_force_path_style,
        },
        conditional_writes: args.conditional_writes,
    })
}

pub fn report_validation_errors(validation_errors: &[String]) {
    for error in validation_errors {
        tracing::error!("invalid configuration: {error}");
    }
}
