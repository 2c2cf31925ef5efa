use std::path::PathBuf;

use anyhow::{bail, Context};
use meshpick::ViewerConfig;

const USAGE: &str = "usage: meshpick [--config <path>] [mesh files...]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    meshes: Vec<PathBuf>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "-h" | "--help" => bail!("{}", USAGE),
            flag if flag.starts_with("--") => bail!("unknown option '{}'\n{}", flag, USAGE),
            path => parsed.meshes.push(PathBuf::from(path)),
        }
    }

    Ok(parsed)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let config = match &args.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    log::info!("meshpick starting, {} file(s) to import", args.meshes.len());
    meshpick::run(config, &args.meshes).context("viewer exited with an error")?;
    log::info!("Goodbye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_config_and_meshes() {
        let args = parse_args(strings(&["a.obj", "--config", "viewer.json", "b.obj"])).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("viewer.json")));
        assert_eq!(args.meshes, vec![PathBuf::from("a.obj"), PathBuf::from("b.obj")]);
    }

    #[test]
    fn test_missing_config_value() {
        assert!(parse_args(strings(&["--config"])).is_err());
    }

    #[test]
    fn test_unknown_option() {
        assert!(parse_args(strings(&["--fullscreen"])).is_err());
    }

    #[test]
    fn test_no_arguments() {
        assert_eq!(parse_args(Vec::new()).unwrap(), Args::default());
    }
}
