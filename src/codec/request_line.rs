/***************************************/
/*        3rd party libraries          */
/***************************************/
use chrono::NaiveTime;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{Direction, Error, Fault, FloorEvent};

pub const TIME_FORMAT: &str = "%H:%M:%S%.f";

/**
 * Parses one request record.
 *
 * Format: `HH:mm:ss[.fraction] <origin> <Up|Down> <destination> [passengers] [fault]`
 *
 * Only the encoding is checked here. Whether the request makes sense (distinct
 * floors, consistent direction) is decided by `FloorEvent::validate`.
 */
pub fn parse_request_line(line: &str) -> Result<FloorEvent, Error> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 || fields.len() > 6 {
        return Err(Error::malformed(
            line,
            format!("expected 4 to 6 fields, found {}", fields.len()),
        ));
    }

    let time = parse_time(fields[0]).ok_or_else(|| Error::malformed(line, "bad timestamp"))?;
    let origin_floor = fields[1]
        .parse::<i32>()
        .map_err(|e| Error::malformed(line, format!("origin floor: {}", e)))?;
    let direction = fields[2]
        .parse::<Direction>()
        .map_err(|e| Error::malformed(line, e))?;
    let destination_floor = fields[3]
        .parse::<i32>()
        .map_err(|e| Error::malformed(line, format!("destination floor: {}", e)))?;

    let mut event = FloorEvent::new(time, origin_floor, direction, destination_floor);

    if let Some(passengers) = fields.get(4) {
        let passengers = passengers
            .parse::<u32>()
            .map_err(|e| Error::malformed(line, format!("passenger count: {}", e)))?;
        event = event.with_passengers(passengers);
    }
    if let Some(fault) = fields.get(5) {
        let fault = fault.parse::<Fault>().map_err(|e| Error::malformed(line, e))?;
        event = event.with_fault(fault);
    }

    Ok(event)
}

/// Writes a record `parse_request_line` reads back to the same event.
pub fn encode_request_line(event: &FloorEvent) -> String {
    let direction = match event.direction {
        Direction::Up => "Up",
        Direction::Down => "Down",
    };
    format!(
        "{} {} {} {} {} {:?}",
        event.time.format(TIME_FORMAT),
        event.origin_floor,
        direction,
        event.destination_floor,
        event.passengers,
        event.fault
    )
}

pub(crate) fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}
