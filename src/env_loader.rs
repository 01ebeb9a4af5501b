use std::env;
use std::path::PathBuf;

fn fallback_dotenv_path(ledger_home: Option<PathBuf>) -> Option<PathBuf> {
    Some(ledger_home?.join(".env"))
}

pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let Some(path) = fallback_dotenv_path(env::var_os("TRACKLEDGER_HOME").map(PathBuf::from))
    else {
        return;
    };
    if path.is_file() {
        let _ = dotenvy::from_path(&path);
    }
}
