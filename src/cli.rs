use crate::config::ManipulationConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    config_path: Option<PathBuf>,
    sizing_factor: Option<f32>,
    rotate_speed_degrees: Option<f32>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Use --config/--sizing-factor/--rotate-speed with values.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config_path = Some(PathBuf::from(value)),
                "sizing-factor" => {
                    overrides.sizing_factor = Some(parse_positive("sizing factor", &value)?);
                }
                "rotate-speed" => {
                    overrides.rotate_speed_degrees = Some(
                        value.parse::<f32>().with_context(|| format!("Invalid rotate speed '{value}'"))?,
                    );
                }
                _ => bail!("Unknown flag '{flag}'. Supported flags: --config, --sizing-factor, --rotate-speed."),
            }
        }
        Ok(overrides)
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }

    pub fn into_config_overrides(self) -> ManipulationConfigOverrides {
        ManipulationConfigOverrides {
            sizing_factor: self.sizing_factor,
            rotate_speed_degrees: self.rotate_speed_degrees,
        }
    }
}

fn parse_positive(name: &str, value: &str) -> Result<f32> {
    let parsed = value.parse::<f32>().with_context(|| format!("Invalid {name} '{value}'"))?;
    if !(parsed.is_finite() && parsed > 0.0) {
        bail!("Invalid {name} '{value}'. Expected a positive number.");
    }
    Ok(parsed)
}
