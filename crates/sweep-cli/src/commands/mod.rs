pub mod compile;
pub mod inspect;

use std::error::Error;
use std::path::Path;

use sweep_plan::{load_config, ParameterFiles, SweepConfig};

/// Loads the sweep definition and the parameter tree it points at.
pub(crate) fn load_sweep(
    params: &Path,
    params_root: Option<&Path>,
) -> Result<(SweepConfig, ParameterFiles), Box<dyn Error>> {
    let config = load_config(params)?;
    let root = params_root
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.params_root());
    Ok((config, ParameterFiles::new(root)))
}
