//! Vehicle feeds
//!
//! A feed hands the controller admission requests once per tick. Two feeds
//! exist: [`TimerFeed`] generates vehicles in-process at random intervals,
//! and [`FileFeed`] polls the `lane<ROAD>.txt` files written by an external
//! producer. [`LaneFileWriter`] is the writing half of that file channel.
//!
//! Record format, one per line: `<PLATE>:<ROAD><LANE>:<PRIORITY>`, e.g.
//! `AB1CD234:A2:0`.

use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::FeedConfig;
use super::error::FeedError;
use super::types::{Lane, LaneId, Plate, Road, PLATE_LEN};

/// A request to admit one vehicle into a lane queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionRequest {
    pub plate: Plate,
    pub lane: LaneId,
    pub priority: bool,
}

impl fmt::Display for AdmissionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.plate, self.lane, u8::from(self.priority))
    }
}

impl FromStr for AdmissionRequest {
    type Err = FeedError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.split(':');
        let (Some(plate), Some(lane), Some(priority), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(FeedError::malformed(line, "expected three ':'-separated fields"));
        };
        let plate: Plate = plate.parse()?;
        let lane: LaneId = lane.parse()?;
        let priority = match priority {
            "0" => false,
            "1" => true,
            _ => return Err(FeedError::malformed(line, "priority must be 0 or 1")),
        };
        Ok(AdmissionRequest {
            plate,
            lane,
            priority,
        })
    }
}

/// Everything a feed produced in one poll
#[derive(Debug, Default)]
pub struct FeedPoll {
    pub requests: Vec<AdmissionRequest>,
    /// Non-fatal problems, already logged by the feed
    pub errors: Vec<FeedError>,
    /// Records skipped because their plate was seen before
    pub duplicates: usize,
}

/// Source of admission requests, polled once per tick
pub trait VehicleFeed {
    /// Collect the requests that became available by `now`. Never blocks
    /// for longer than a short file read and never fails the tick.
    fn poll(&mut self, now: Duration) -> FeedPoll;
}

/// A feed that never produces anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFeed;

impl VehicleFeed for NoFeed {
    fn poll(&mut self, _now: Duration) -> FeedPoll {
        FeedPoll::default()
    }
}

/// Random vehicle generator shared by the timer feed and the file producer.
///
/// Plates follow the `LLDLLDDD` pattern. Road and lane are uniform. Lane A2
/// records carry priority once `priority_threshold` A2 records have already
/// been generated; the count is kept in memory.
pub struct VehicleGenerator {
    rng: Option<StdRng>,
    priority_lane: LaneId,
    priority_threshold: usize,
    priority_lane_count: usize,
}

impl VehicleGenerator {
    pub fn new(priority_threshold: usize) -> Self {
        Self::new_internal(None, priority_threshold)
    }

    /// Create a generator with a seeded RNG for reproducible runs
    pub fn new_with_seed(seed: u64, priority_threshold: usize) -> Self {
        Self::new_internal(Some(StdRng::seed_from_u64(seed)), priority_threshold)
    }

    fn new_internal(rng: Option<StdRng>, priority_threshold: usize) -> Self {
        Self {
            rng,
            priority_lane: LaneId::new(Road::A, Lane::Middle),
            priority_threshold,
            priority_lane_count: 0,
        }
    }

    fn random_range(&mut self, range: std::ops::Range<u64>) -> u64 {
        match &mut self.rng {
            Some(rng) => rng.random_range(range),
            None => rand::rng().random_range(range),
        }
    }

    pub fn plate(&mut self) -> Plate {
        const PATTERN: &[u8; PLATE_LEN] = b"LLDLLDDD";
        let mut bytes = [0u8; PLATE_LEN];
        for (byte, kind) in bytes.iter_mut().zip(PATTERN) {
            *byte = match kind {
                b'L' => b'A' + self.random_range(0..26) as u8,
                _ => b'0' + self.random_range(0..10) as u8,
            };
        }
        Plate::from_generated(bytes)
    }

    /// Priority flag for a new record on `lane`, counting it toward the threshold
    pub fn priority_for(&mut self, lane: LaneId) -> bool {
        if lane != self.priority_lane {
            return false;
        }
        let priority = self.priority_lane_count >= self.priority_threshold;
        self.priority_lane_count += 1;
        priority
    }

    pub fn next_request(&mut self) -> AdmissionRequest {
        let plate = self.plate();
        let road = Road::ALL[self.random_range(0..4) as usize];
        let lane = Lane::ALL[self.random_range(0..3) as usize];
        let lane = LaneId::new(road, lane);
        AdmissionRequest {
            plate,
            lane,
            priority: self.priority_for(lane),
        }
    }

    /// Random gap in `[min, max]`, millisecond resolution
    pub fn interval(&mut self, min: Duration, max: Duration) -> Duration {
        let min_ms = min.as_millis() as u64;
        let max_ms = max.as_millis() as u64;
        Duration::from_millis(self.random_range(min_ms..max_ms + 1))
    }
}

/// In-process feed: one generated vehicle every 1–3 seconds of simulated time
pub struct TimerFeed {
    generator: VehicleGenerator,
    min_interval: Duration,
    max_interval: Duration,
    next_due: Duration,
}

impl TimerFeed {
    pub fn new(generator: VehicleGenerator, config: &FeedConfig) -> Self {
        Self {
            generator,
            min_interval: config.min_interval,
            max_interval: config.max_interval,
            next_due: Duration::ZERO,
        }
    }
}

impl VehicleFeed for TimerFeed {
    fn poll(&mut self, now: Duration) -> FeedPoll {
        let mut poll = FeedPoll::default();
        while self.next_due <= now {
            let request = self.generator.next_request();
            debug!("Generated vehicle {}", request);
            poll.requests.push(request);
            // A zero gap would never let the loop catch up with `now`
            self.next_due += self
                .generator
                .interval(self.min_interval, self.max_interval)
                .max(Duration::from_millis(1));
        }
        poll
    }
}

/// Name of the channel file for `road`
pub fn channel_file_name(road: Road) -> String {
    format!("lane{}.txt", road)
}

/// Read position in one channel file
#[derive(Debug, Default, Clone)]
struct ChannelCursor {
    offset: u64,
    /// First line consumed from the file, used to spot a rewritten file
    head: Vec<u8>,
}

impl ChannelCursor {
    fn reset(&mut self) {
        self.offset = 0;
        self.head.clear();
    }
}

/// Consumer side of the file channel.
///
/// Each poll opens every `lane<ROAD>.txt`, reads whatever was appended
/// since the last poll and closes it again. A partial last line stays in
/// the file until its newline arrives. Plates are deduplicated for the
/// whole run, so re-reading a file never admits a vehicle twice.
///
/// A file that shrank, or whose first line no longer matches the one read
/// earlier, was rewritten by a restarted producer and is read again from
/// the top. A rewrite that reproduces the old first line byte for byte is
/// indistinguishable from an append.
pub struct FileFeed {
    dir: PathBuf,
    cursors: [ChannelCursor; 4],
    missing_reported: [bool; 4],
    seen: HashSet<Plate>,
}

impl FileFeed {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cursors: Default::default(),
            missing_reported: [false; 4],
            seen: HashSet::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Plates admitted so far
    pub fn seen(&self) -> usize {
        self.seen.len()
    }

    /// Forget read positions so the next poll starts from the top of every
    /// file. The seen-set is kept.
    pub fn rewind(&mut self) {
        for cursor in &mut self.cursors {
            cursor.reset();
        }
    }

    /// Read the complete lines appended to `path` since the cursor
    fn read_appended(path: &Path, cursor: &mut ChannelCursor) -> io::Result<String> {
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();
        if len < cursor.offset {
            debug!("{:?} shrank to {} bytes, reading from the start", path, len);
            cursor.reset();
        } else if cursor.offset > 0 {
            let mut head = vec![0u8; cursor.head.len()];
            file.read_exact(&mut head)?;
            if head != cursor.head {
                debug!("{:?} was rewritten, reading from the start", path);
                cursor.reset();
            }
        }
        file.seek(SeekFrom::Start(cursor.offset))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        let complete = match bytes.iter().rposition(|&b| b == b'\n') {
            Some(last_newline) => last_newline + 1,
            None => return Ok(String::new()),
        };
        bytes.truncate(complete);
        if cursor.offset == 0 {
            let first_line = bytes.iter().position(|&b| b == b'\n').map_or(0, |i| i + 1);
            cursor.head = bytes[..first_line].to_vec();
        }
        cursor.offset += complete as u64;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl VehicleFeed for FileFeed {
    fn poll(&mut self, _now: Duration) -> FeedPoll {
        let mut poll = FeedPoll::default();

        for road in Road::ALL {
            let path = self.dir.join(channel_file_name(road));
            let index = road.index();
            let text = match Self::read_appended(&path, &mut self.cursors[index]) {
                Ok(text) => {
                    self.missing_reported[index] = false;
                    text
                }
                Err(source) => {
                    if !self.missing_reported[index] {
                        warn!("Feed channel {:?} unavailable: {}", path, source);
                        self.missing_reported[index] = true;
                    }
                    poll.errors.push(FeedError::Unavailable { path, source });
                    continue;
                }
            };

            for line in text.lines() {
                let line = line.trim_end_matches('\r');
                if line.is_empty() {
                    continue;
                }
                let request = match line.parse::<AdmissionRequest>() {
                    Ok(request) if request.lane.road != road => {
                        Err(FeedError::malformed(line, "record road does not match its channel"))
                    }
                    other => other,
                };
                match request {
                    Ok(request) => {
                        if self.seen.insert(request.plate) {
                            poll.requests.push(request);
                        } else {
                            debug!("Skipping already admitted plate {}", request.plate);
                            poll.duplicates += 1;
                        }
                    }
                    Err(err) => {
                        warn!("Dropping feed record: {}", err);
                        poll.errors.push(err);
                    }
                }
            }
        }

        poll
    }
}

/// Producer side of the file channel
pub struct LaneFileWriter {
    dir: PathBuf,
}

impl LaneFileWriter {
    /// Create (or truncate) the four channel files in `dir`
    pub fn create(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        for road in Road::ALL {
            File::create(dir.join(channel_file_name(road)))?;
        }
        Ok(Self { dir })
    }

    /// Append one record to its road's file
    pub fn append(&self, request: &AdmissionRequest) -> io::Result<()> {
        let path = self.dir.join(channel_file_name(request.lane.road));
        let mut file = OpenOptions::new().append(true).create(true).open(path)?;
        writeln!(file, "{}", request)?;
        file.flush()
    }

    /// Generate `count` vehicles and append them, returning what was written
    pub fn produce(
        &self,
        generator: &mut VehicleGenerator,
        count: usize,
    ) -> io::Result<Vec<AdmissionRequest>> {
        let mut written = Vec::with_capacity(count);
        for _ in 0..count {
            let request = generator.next_request();
            self.append(&request)?;
            written.push(request);
        }
        Ok(written)
    }
}
