use chrono::NaiveTime;
use std::fmt;
use std::str::FromStr;

use crate::codec::request_line::{parse_time, TIME_FORMAT};
use crate::shared::{Direction, Error, Fault, Request, WorkerId};

const KEYS: [&str; 9] = [
    "Elevator",
    "Time",
    "Requested Floor",
    "Direction",
    "Car Button",
    "Number of Passengers",
    "Arrived",
    "Fault",
    "More Floor Events",
];

/**
 * The status record exchanged with transports and logs.
 *
 * Textual form, fields always in this order:
 * `{Elevator: 1, Time: 13:02:56, Requested Floor: 4, Direction: UP, Car Button: 6,
 *   Number of Passengers: 0, Arrived: false, Fault: No Fault, More Floor Events: false}`
 *
 * `Display` and `FromStr` are exact inverses.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub elevator: WorkerId,
    pub time: NaiveTime,
    pub requested_floor: i32,
    pub direction: Direction,
    pub car_button: i32,
    pub passengers: u32,
    pub arrived: bool,
    pub fault: Fault,
    pub more_floor_events: bool,
}

impl StatusMessage {
    pub fn from_request(elevator: WorkerId, request: &Request, more_floor_events: bool) -> Self {
        StatusMessage {
            elevator,
            time: request.created_at,
            requested_floor: request.origin_floor,
            direction: request.direction,
            car_button: request.destination_floor,
            passengers: request.passenger_count,
            arrived: request.arrived,
            fault: request.fault,
            more_floor_events,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<StatusMessage, Error> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::malformed(&String::from_utf8_lossy(bytes), e.to_string()))?;
        text.parse()
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Elevator: {}, Time: {}, Requested Floor: {}, Direction: {}, Car Button: {}, \
             Number of Passengers: {}, Arrived: {}, Fault: {}, More Floor Events: {}}}",
            self.elevator,
            self.time.format(TIME_FORMAT),
            self.requested_floor,
            self.direction,
            self.car_button,
            self.passengers,
            self.arrived,
            self.fault.description(),
            self.more_floor_events
        )
    }
}

impl FromStr for StatusMessage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .trim()
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(|| Error::malformed(s, "missing braces"))?;

        let parts: Vec<&str> = body.split(", ").collect();
        if parts.len() != KEYS.len() {
            return Err(Error::malformed(
                s,
                format!("expected {} fields, found {}", KEYS.len(), parts.len()),
            ));
        }

        let mut values = Vec::with_capacity(KEYS.len());
        for (part, key) in parts.iter().zip(KEYS.iter()) {
            match part.split_once(": ") {
                Some((k, v)) if k == *key => values.push(v),
                _ => return Err(Error::malformed(s, format!("expected field '{}'", key))),
            }
        }

        let bad = |field: &str| Error::malformed(s, format!("bad value for '{}'", field));

        Ok(StatusMessage {
            elevator: values[0].parse().map_err(|_| bad(KEYS[0]))?,
            time: parse_time(values[1]).ok_or_else(|| bad(KEYS[1]))?,
            requested_floor: values[2].parse().map_err(|_| bad(KEYS[2]))?,
            direction: values[3].parse().map_err(|_| bad(KEYS[3]))?,
            car_button: values[4].parse().map_err(|_| bad(KEYS[4]))?,
            passengers: values[5].parse().map_err(|_| bad(KEYS[5]))?,
            arrived: values[6].parse().map_err(|_| bad(KEYS[6]))?,
            fault: values[7].parse().map_err(|_| bad(KEYS[7]))?,
            more_floor_events: values[8].parse().map_err(|_| bad(KEYS[8]))?,
        })
    }
}
