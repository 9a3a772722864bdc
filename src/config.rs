/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::shared::Error;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub dispatcher: DispatcherConfig,
    pub elevator: ElevatorConfig,
    pub source: SourceConfig,
    pub network: NetworkConfig,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Requests the run waits for. 0 means "every valid request loaded".
    pub total_requests: u64,
}

/**
 * Timing and shape of the elevator bank. All times are in milliseconds.
 */
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ElevatorConfig {
    pub n_elevators: usize,
    pub n_floors: i32,
    pub initial_floor: i32,
    pub floor_travel_time: u64,
    pub door_close_time: u64,
    pub door_fault_time: u64,
    pub en_route_pickups: bool,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SourceConfig {
    pub request_file: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct NetworkConfig {
    /// "host:port" of the status receiver. Empty disables the relay.
    pub status_addr: String,
}

impl Default for ElevatorConfig {
    fn default() -> Self {
        ElevatorConfig {
            n_elevators: 2,
            n_floors: 10,
            initial_floor: 1,
            floor_travel_time: 500,
            door_close_time: 7680,
            door_fault_time: 7800,
            en_route_pickups: true,
        }
    }
}

impl ElevatorConfig {
    pub fn floor_travel(&self) -> Duration {
        Duration::from_millis(self.floor_travel_time.max(1))
    }

    pub fn door_close(&self) -> Duration {
        Duration::from_millis(self.door_close_time)
    }

    pub fn door_fault(&self) -> Duration {
        Duration::from_millis(self.door_fault_time)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            request_file: "requests.txt".to_string(),
        }
    }
}

/***************************************/
/*             Public API              */
/***************************************/
impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Config::parse(&config_str)
    }

    pub fn parse(config_str: &str) -> Result<Config, Error> {
        let config: Config = toml::from_str(config_str)
            .map_err(|e| Error::Config(format!("failed to parse configuration: {}", e)))?;
        config.check()?;
        Ok(config)
    }

    /// Validates the bank's shape. Run again after overriding values.
    pub fn check(&self) -> Result<(), Error> {
        let e = &self.elevator;
        if e.n_elevators == 0 {
            return Err(Error::Config("n_elevators must be at least 1".into()));
        }
        if e.n_floors < 2 {
            return Err(Error::Config("n_floors must be at least 2".into()));
        }
        if e.initial_floor < 1 || e.initial_floor > e.n_floors {
            return Err(Error::Config(format!(
                "initial_floor {} outside 1..={}",
                e.initial_floor, e.n_floors
            )));
        }
        Ok(())
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_config_defaults_when_sections_missing() {
        // Arrange
        let text = "[elevator]\nn_elevators = 3\n";

        // Act
        let config = Config::parse(text).unwrap();

        // Assert
        assert_eq!(config.elevator.n_elevators, 3);
        assert_eq!(config.elevator.door_close_time, 7680);
        assert_eq!(config.elevator.door_fault_time, 7800);
        assert_eq!(config.dispatcher.total_requests, 0);
        assert!(config.network.status_addr.is_empty());
    }

    #[test]
    fn test_config_rejects_zero_elevators() {
        let text = "[elevator]\nn_elevators = 0\n";
        assert!(matches!(Config::parse(text), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_rejects_initial_floor_out_of_range() {
        let text = "[elevator]\nn_floors = 5\ninitial_floor = 6\n";
        assert!(matches!(Config::parse(text), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_check_rejects_overridden_zero_elevators() {
        // Arrange
        let mut config = Config::parse("[elevator]\nn_elevators = 2\n").unwrap();

        // Act
        config.elevator.n_elevators = 0;

        // Assert
        assert!(matches!(config.check(), Err(Error::Config(_))));
    }
}
