//! Configuration of [`ReplayBuffer`](super::ReplayBuffer).
use super::Schema;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ReplayBuffer`](super::ReplayBuffer).
///
/// ```
/// use lookahead_replay::{ReplayBufferConfig, Schema};
///
/// let config = ReplayBufferConfig::default()
///     .capacity(1_000_000)
///     .seed(0)
///     .schema(Schema::transitions(&[11], &[3], true));
/// assert_eq!(config.capacity, 1_000_000);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayBufferConfig {
    /// Maximum number of transitions. The oldest one is evicted beyond that.
    pub capacity: usize,

    /// Seed of the random number generator used for sampling.
    pub seed: u64,

    /// Field layout of the transitions.
    pub schema: Schema,
}

impl Default for ReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            seed: 42,
            schema: Schema::new(),
        }
    }
}

impl ReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the field layout.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_replay_buffer_config() -> Result<()> {
        let config = ReplayBufferConfig::default()
            .capacity(100)
            .seed(3)
            .schema(Schema::transitions(&[4], &[2], true));

        let dir = TempDir::new("replay_buffer_config")?;
        let path = dir.path().join("replay_buffer_config.yaml");
        println!("{:?}", path);

        config.save(&path)?;
        let config_ = ReplayBufferConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_load_from_yaml_text() -> Result<()> {
        let yaml = "capacity: 3\nseed: 1\nschema:\n  obs: [1]\n  rew: [1]\n";
        let config: ReplayBufferConfig = serde_yaml::from_str(yaml)?;
        assert_eq!(config.capacity, 3);
        assert_eq!(config.schema.shape("obs"), Some(&[1][..]));
        assert_eq!(config.schema.len(), 2);
        Ok(())
    }
}
