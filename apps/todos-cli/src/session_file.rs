//! JSON file standing in for a session store between CLI invocations.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use domain::Session;

/// Read the session at `path`; a missing file is an empty session.
pub fn load(path: &Path) -> Result<Session, String> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no session file, starting empty");
            return Ok(Session::default());
        }
        Err(e) => return Err(format!("read session {}: {}", path.display(), e)),
    };
    serde_json::from_str(&raw).map_err(|e| format!("parse session {}: {}", path.display(), e))
}

/// Write the session to `path`, creating parent directories as needed.
pub fn save(path: &Path, session: &Session) -> Result<(), String> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| format!("create {}: {}", dir.display(), e))?;
    }
    let raw = serde_json::to_string_pretty(session)
        .map_err(|e| format!("serialize session: {}", e))?;
    fs::write(path, raw).map_err(|e| format!("write session {}: {}", path.display(), e))
}
