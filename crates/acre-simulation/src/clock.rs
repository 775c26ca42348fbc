use std::fmt;

use acre_core::calendar::{DAYS_PER_SEASON, Season};
use serde::{Deserialize, Serialize};

/// First time of day, as `HHMM`.
pub const DAY_START: u32 = 600;
/// Time of day at which the clock stops until the day ends.
pub const DAY_END: u32 = 2600;

/// A calendar date: year, season and day of the season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameDate {
    /// Year, starting at 1.
    pub year: u32,
    /// Current season.
    pub season: Season,
    /// `1..=28`.
    pub day: u32,
}

impl Default for GameDate {
    fn default() -> Self {
        Self {
            year: 1,
            season: Season::Spring,
            day: 1,
        }
    }
}

impl GameDate {
    /// A date with the year raised to at least 1 and the day clamped to the season.
    pub fn new(year: u32, season: Season, day: u32) -> Self {
        Self {
            year: year.max(1),
            season,
            day: day.clamp(1, DAYS_PER_SEASON),
        }
    }

    /// The following day, rolling over seasons and years.
    pub fn next(self) -> Self {
        if self.day < DAYS_PER_SEASON {
            return Self {
                day: self.day + 1,
                ..self
            };
        }
        let season = self.season.next();
        let year = if season == Season::Spring {
            self.year + 1
        } else {
            self.year
        };
        Self {
            year,
            season,
            day: 1,
        }
    }

    /// Days since the start of year one, counting from 1.
    pub fn absolute_day(&self) -> u32 {
        (self.year.max(1) - 1) * 4 * DAYS_PER_SEASON + self.season.index() * DAYS_PER_SEASON + self.day
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}, year {}", self.season, self.day, self.year)
    }
}

/// Frame counter, time of day and calendar.
///
/// Time advances in ten-minute steps once enough frame milliseconds have
/// accumulated. At [`DAY_END`] the clock holds until the day is ended.
#[derive(Debug, Clone)]
pub struct SimClock {
    frame: u64,
    date: GameDate,
    time_of_day: u32,
    ms_per_ten_minutes: u32,
    accumulated_ms: u32,
    minutes_this_frame: u32,
    paused: bool,
}

impl SimClock {
    /// Clock at the start of `date`'s day.
    pub fn new(date: GameDate, ms_per_ten_minutes: u32) -> Self {
        Self {
            frame: 0,
            date,
            time_of_day: DAY_START,
            ms_per_ten_minutes: ms_per_ten_minutes.max(1),
            accumulated_ms: 0,
            minutes_this_frame: 0,
            paused: false,
        }
    }

    /// Start a new frame. Returns the in-game minutes that passed.
    pub fn advance_frame(&mut self, elapsed_ms: u32) -> u32 {
        self.frame += 1;
        self.minutes_this_frame = 0;
        if !self.should_time_pass() {
            return 0;
        }
        self.accumulated_ms += elapsed_ms;
        while self.accumulated_ms >= self.ms_per_ten_minutes && self.time_of_day < DAY_END {
            self.accumulated_ms -= self.ms_per_ten_minutes;
            self.time_of_day = add_ten_minutes(self.time_of_day);
            self.minutes_this_frame += 10;
        }
        if self.time_of_day >= DAY_END {
            self.accumulated_ms = 0;
        }
        self.minutes_this_frame
    }

    /// Roll over to the next morning.
    pub fn advance_day(&mut self) -> GameDate {
        self.date = self.date.next();
        self.time_of_day = DAY_START;
        self.accumulated_ms = 0;
        self.minutes_this_frame = 0;
        self.date
    }

    /// Frames simulated so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Today's date.
    pub fn date(&self) -> GameDate {
        self.date
    }

    /// Today's season.
    pub fn season(&self) -> Season {
        self.date.season
    }

    /// Days since the start of year one.
    pub fn absolute_day(&self) -> u32 {
        self.date.absolute_day()
    }

    /// Time of day as `HHMM`, from `600` to `2600`.
    pub fn time_of_day(&self) -> u32 {
        self.time_of_day
    }

    /// In-game minutes that passed during the current frame.
    pub fn minutes_this_frame(&self) -> u32 {
        self.minutes_this_frame
    }

    /// `false` while paused (menus, cutscenes) or once the day has run out.
    pub fn should_time_pass(&self) -> bool {
        !self.paused && self.time_of_day < DAY_END
    }

    /// Stop time of day from advancing.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Let time of day advance again.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether time of day is held.
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

fn add_ten_minutes(time: u32) -> u32 {
    if time % 100 >= 50 {
        time - time % 100 + 100
    } else {
        time + 10
    }
}
