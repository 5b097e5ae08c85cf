use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Listening host
    #[arg(long, env = "REDEEM_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Listening port
    #[arg(short, long, env = "REDEEM_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Storage backend type: S3, FILESYSTEM or MEMORY
    #[arg(short, long, env = "REDEEM_STORAGE", default_value = "S3")]
    pub storage: String,

    /// Bucket holding the token records
    #[arg(long, env = "REDEEM_BUCKET", default_value = "secret-santa-pairings-dev")]
    pub bucket: String,

    /// Root directory of the FILESYSTEM backend
    #[arg(long, env = "REDEEM_ROOTDIR", default_value = "/var/lib/redemption")]
    pub root: String,

    /// Prefix prepended to every `<token>.json` key
    #[arg(long, env = "REDEEM_KEY_PREFIX", default_value = "")]
    pub key_prefix: String,

    /// Endpoint of an S3-compatible store
    #[arg(long, env = "REDEEM_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// Region of the bucket
    #[arg(long, env = "REDEEM_S3_REGION")]
    pub s3_region: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long, env = "REDEEM_S3_FORCE_PATH_STYLE", default_value_t = false, action = ArgAction::Set)]
    pub s3_force_path_style: bool,

    /// Guard the status write-back with the version read (If-Match)
    #[arg(long, env = "REDEEM_CONDITIONAL_WRITES", default_value_t = true, action = ArgAction::Set)]
    pub conditional_writes: bool,
}
