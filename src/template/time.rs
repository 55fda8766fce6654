//! The 7-byte GATT date-time structure.

use crate::error::GattError;
use crate::template::Reader;
use std::fmt::{self, Display, Formatter};

/// A calendar date and time as carried by the Date Time characteristic and
/// embedded in several measurement records.
///
/// A year of 0 means the year is not known; month and day may likewise be 0.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    pub const ENCODED_LENGTH: usize = 7;

    /// Decodes from a reader, leaving any following fields unconsumed.
    pub fn read(reader: &mut Reader) -> Result<Self, GattError> {
        let date_time = Self {
            year: reader.u16()?,
            month: reader.u8()?,
            day: reader.u8()?,
            hour: reader.u8()?,
            minute: reader.u8()?,
            second: reader.u8()?,
        };
        date_time.validate()?;
        Ok(date_time)
    }

    pub fn decode(data: &[u8]) -> Result<Self, GattError> {
        if data.len() != Self::ENCODED_LENGTH {
            return Err(GattError::WrongLength {
                length: data.len(),
                expected_length: Self::ENCODED_LENGTH,
            });
        }
        let mut reader = Reader::new(data);
        Self::read(&mut reader)
    }

    pub fn encode(&self) -> Result<Vec<u8>, GattError> {
        self.validate()?;
        let mut data = Vec::with_capacity(Self::ENCODED_LENGTH);
        data.extend_from_slice(&self.year.to_le_bytes());
        data.push(self.month);
        data.push(self.day);
        data.push(self.hour);
        data.push(self.minute);
        data.push(self.second);
        Ok(data)
    }

    fn validate(&self) -> Result<(), GattError> {
        let checks = [
            (self.year != 0 && !(1582..=9999).contains(&self.year), self.year as f64, 1582.0, 9999.0),
            (self.month > 12, self.month as f64, 0.0, 12.0),
            (self.day > 31, self.day as f64, 0.0, 31.0),
            (self.hour > 23, self.hour as f64, 0.0, 23.0),
            (self.minute > 59, self.minute as f64, 0.0, 59.0),
            (self.second > 59, self.second as f64, 0.0, 59.0),
        ];
        for (out_of_range, value, min, max) in checks {
            if out_of_range {
                return Err(GattError::OutOfRange { value, min, max });
            }
        }
        Ok(())
    }
}

impl Display for DateTime {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.year == 0 {
            write!(
                f,
                "unknown date {:02}:{:02}:{:02}",
                self.hour, self.minute, self.second
            )
        } else {
            write!(
                f,
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                self.year, self.month, self.day, self.hour, self.minute, self.second
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_valid() {
        assert_eq!(
            DateTime::decode(&[0xe8, 0x07, 0x03, 0x01, 0x0c, 0x1e, 0x05]).unwrap(),
            DateTime {
                year: 2024,
                month: 3,
                day: 1,
                hour: 12,
                minute: 30,
                second: 5,
            }
        );
    }

    #[test]
    fn decode_unknown_year() {
        let decoded = DateTime::decode(&[0x00, 0x00, 0x00, 0x00, 0x17, 0x3b, 0x3b]).unwrap();
        assert_eq!(decoded.year, 0);
        assert_eq!(decoded.to_string(), "unknown date 23:59:59");
    }

    #[test]
    fn decode_wrong_length() {
        assert_eq!(
            DateTime::decode(&[0xe8, 0x07, 0x03]),
            Err(GattError::WrongLength {
                length: 3,
                expected_length: 7
            })
        );
    }

    #[test]
    fn decode_out_of_range_fields() {
        // Month 13.
        assert!(matches!(
            DateTime::decode(&[0xe8, 0x07, 0x0d, 0x01, 0x00, 0x00, 0x00]),
            Err(GattError::OutOfRange { .. })
        ));
        // Hour 24.
        assert!(matches!(
            DateTime::decode(&[0xe8, 0x07, 0x01, 0x01, 0x18, 0x00, 0x00]),
            Err(GattError::OutOfRange { .. })
        ));
        // Year 100.
        assert!(matches!(
            DateTime::decode(&[0x64, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00]),
            Err(GattError::OutOfRange { .. })
        ));
    }

    #[test]
    fn round_trip() {
        let date_time = DateTime {
            year: 2026,
            month: 8,
            day: 1,
            hour: 9,
            minute: 15,
            second: 42,
        };
        assert_eq!(
            DateTime::decode(&date_time.encode().unwrap()).unwrap(),
            date_time
        );
    }

    #[test]
    fn format() {
        assert_eq!(
            DateTime {
                year: 2024,
                month: 3,
                day: 1,
                hour: 12,
                minute: 30,
                second: 5,
            }
            .to_string(),
            "2024-03-01 12:30:05"
        );
    }
}
