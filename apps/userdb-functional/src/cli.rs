use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use userdb_functional::env_file::{self, DEFAULT_ENV_FILE};
use userdb_functional::suites::Suite;
use userdb_functional::HarnessError;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Server base URL; overrides the port read from the env file
    #[arg(long, env = "USER_DB_URL")]
    pub url: Option<String>,

    /// File holding the server port as USER_DB_PORT=<port>
    #[arg(long, default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,

    /// Suite to run
    #[arg(short, long, value_enum, default_value_t = SuiteArg::All)]
    pub suite: SuiteArg,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuiteArg {
    Users,
    Products,
    Projects,
    Assets,
    /// Every suite, in the order above
    All,
}

impl SuiteArg {
    pub fn suites(self) -> Vec<Suite> {
        match self {
            SuiteArg::Users => vec![Suite::Users],
            SuiteArg::Products => vec![Suite::Products],
            SuiteArg::Projects => vec![Suite::Projects],
            SuiteArg::Assets => vec![Suite::Assets],
            SuiteArg::All => Suite::ALL.to_vec(),
        }
    }
}

impl Cli {
    /// URL of the server under test.
    pub fn base_url(&self) -> Result<String, HarnessError> {
        if let Some(url) = &self.url {
            return Ok(url.trim_end_matches('/').to_string());
        }
        let port = env_file::read_port(&self.env_file)?;
        Ok(format!("http://127.0.0.1:{}", port))
    }
}
