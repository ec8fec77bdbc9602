//! Crate-wide constants.

/// Application name, used in log targets and temp file prefixes.
pub const APP_NAME: &str = "pdkit";

/// Environment variable overriding the synthesis output directory.
pub const OUT_DIR_ENV: &str = "PDKIT_OUT_DIR";

/// Environment variable enabling dry-run synthesis (`1`, `true`, `yes`).
pub const DRY_RUN_ENV: &str = "PDKIT_DRY_RUN";

/// Path every top-level project is resolved against.
pub const WORKSPACE_ROOT_PATH: &str = "/";

/// Default source and dist path of a project.
pub const DEFAULT_PROJECT_SUBPATH: &str = ".";

/// Sentinel value marking a dependency entry whose version is not yet known.
pub const UNRESOLVED_MARKER: &str = "*";
