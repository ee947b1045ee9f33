use backdrop_common::Color;
use rand::RngExt;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating content configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config extension: {0}")]
    UnsupportedFormat(String),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Half-open range `[min, max)` sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Uniform sample; a degenerate range yields `min`.
    pub fn sample(&self, rng: &mut StdRng) -> f32 {
        if self.min < self.max {
            rng.random_range(self.min..self.max)
        } else {
            self.min
        }
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(invalid(field, format!("bad range [{}, {})", self.min, self.max)));
        }
        Ok(())
    }
}

fn check_unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(field, format!("{value} is outside [0, 1]")));
    }
    Ok(())
}

fn check_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(invalid(field, format!("{value} must be positive")));
    }
    Ok(())
}

fn check_smoothing(value: f32) -> Result<(), ConfigError> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid("smoothing", format!("{value} is outside (0, 1]")));
    }
    Ok(())
}

/// Hero background: a rotating cloud of soft point sprites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleFieldConfig {
    pub count: u32,
    /// Side length of the cube the points are scattered in.
    pub extent: f32,
    pub max_scale: f32,
    pub inner_color: Color,
    pub outer_color: Color,
    /// Distance from the origin at which a point reaches `outer_color`.
    pub color_radius: f32,
    pub opacity: f32,
    /// Radians added to X and Y rotation every frame.
    pub spin_per_frame: f32,
    pub pointer_gain: f32,
    pub smoothing: f32,
    pub seed: Option<u64>,
}

impl Default for ParticleFieldConfig {
    fn default() -> Self {
        Self {
            count: 3000,
            extent: 10.0,
            max_scale: 0.8,
            inner_color: Color::new(0.0, 0.8, 1.0),
            outer_color: Color::new(0.5, 0.0, 1.0),
            color_radius: 5.0,
            opacity: 0.7,
            spin_per_frame: 0.0005,
            pointer_gain: 0.5,
            smoothing: 0.02,
            seed: None,
        }
    }
}

impl ParticleFieldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("extent", self.extent)?;
        check_positive("color_radius", self.color_radius)?;
        if !(self.max_scale.is_finite() && self.max_scale >= 0.0) {
            return Err(invalid("max_scale", "must be non-negative"));
        }
        check_unit("opacity", self.opacity)?;
        check_smoothing(self.smoothing)
    }
}

/// Ground grid under the cube field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub size: f32,
    pub divisions: u32,
    pub offset_y: f32,
    pub center_color: Color,
    pub line_color: Color,
    pub spin_per_frame: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 20.0,
            divisions: 20,
            offset_y: -3.0,
            center_color: Color::from_hex(0x0088ff),
            line_color: Color::from_hex(0x001a33),
            spin_per_frame: 0.001,
        }
    }
}

/// Projects background: bobbing wireframe cubes over a turning grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeFieldConfig {
    pub count: u32,
    pub edge: f32,
    pub extent: f32,
    pub red: ValueRange,
    pub green: ValueRange,
    pub blue: ValueRange,
    pub opacity: f32,
    /// Oscillation speed per cube, in radians per second.
    pub speed: ValueRange,
    pub bob_amplitude: f32,
    /// Give each cube a random oscillation phase instead of starting in sync.
    pub random_phase: bool,
    pub spin_per_frame: f32,
    pub grid: GridConfig,
    pub pointer_gain: f32,
    pub smoothing: f32,
    pub seed: Option<u64>,
}

impl Default for CubeFieldConfig {
    fn default() -> Self {
        Self {
            count: 50,
            edge: 0.2,
            extent: 10.0,
            red: ValueRange::new(0.2, 0.7),
            green: ValueRange::new(0.5, 1.0),
            blue: ValueRange::new(0.8, 1.0),
            opacity: 0.6,
            speed: ValueRange::new(0.01, 0.03),
            bob_amplitude: 0.5,
            random_phase: false,
            spin_per_frame: 0.01,
            grid: GridConfig::default(),
            pointer_gain: 0.5,
            smoothing: 0.05,
            seed: None,
        }
    }
}

impl CubeFieldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("edge", self.edge)?;
        check_positive("extent", self.extent)?;
        self.red.validate("red")?;
        self.green.validate("green")?;
        self.blue.validate("blue")?;
        self.speed.validate("speed")?;
        check_unit("opacity", self.opacity)?;
        check_positive("grid.size", self.grid.size)?;
        if self.grid.divisions == 0 {
            return Err(invalid("grid.divisions", "must be at least 1"));
        }
        check_smoothing(self.smoothing)
    }
}

/// Host window settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Backdrop".into(),
            width: 1280,
            height: 720,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropConfig {
    pub window: WindowConfig,
    pub hero: ParticleFieldConfig,
    pub projects: CubeFieldConfig,
}

impl BackdropConfig {
    /// Load from a `.yaml`, `.yml` or `.json` file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let config: Self = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&text)?,
            "json" => serde_json::from_str(&text)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded backdrop config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hero.validate()?;
        self.projects.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_scenes() {
        let hero = ParticleFieldConfig::default();
        assert_eq!(hero.count, 3000);
        assert_eq!(hero.smoothing, 0.02);
        let projects = CubeFieldConfig::default();
        assert_eq!(projects.count, 50);
        assert_eq!(projects.grid.divisions, 20);
        assert_eq!(projects.grid.offset_y, -3.0);
        assert!(BackdropConfig::default().validate().is_ok());
    }

    #[test]
    fn range_samples_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = ValueRange::new(0.01, 0.03);
        for _ in 0..1000 {
            let v = range.sample(&mut rng);
            assert!((0.01..0.03).contains(&v), "{v} out of range");
        }
        let fixed = ValueRange::new(0.5, 0.5);
        assert_eq!(fixed.sample(&mut rng), 0.5);
    }

    #[test]
    fn load_partial_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "hero:\n  count: 500\n  seed: 9\nprojects:\n  grid:\n    divisions: 10\n"
        )
        .unwrap();

        let config = BackdropConfig::load(file.path()).unwrap();
        assert_eq!(config.hero.count, 500);
        assert_eq!(config.hero.seed, Some(9));
        assert_eq!(config.hero.max_scale, 0.8);
        assert_eq!(config.projects.grid.divisions, 10);
        assert_eq!(config.projects.count, 50);
        assert_eq!(config.window.width, 1280);
    }

    #[test]
    fn load_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"window": {{"title": "Portfolio", "width": 1920}}}}"#).unwrap();
        let config = BackdropConfig::load(file.path()).unwrap();
        assert_eq!(config.window.title, "Portfolio");
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.window.height, 720);
    }

    #[test]
    fn unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let err = BackdropConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "toml"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = BackdropConfig::default();
        config.hero.smoothing = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "smoothing", .. })
        ));

        let mut config = BackdropConfig::default();
        config.projects.speed = ValueRange::new(0.05, 0.01);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "speed", .. })
        ));

        let mut config = BackdropConfig::default();
        config.projects.grid.divisions = 0;
        assert!(config.validate().is_err());
    }
}
