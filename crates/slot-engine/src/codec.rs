//! Conversion between persisted availability ranges and the editor's block grid.
//!
//! The availability editor shows each business day as a grid of fixed-size
//! blocks (30 minutes by default) covering the institute's two shifts. The
//! persisted form is the compact [`WeeklySchedule`]. This module expands a
//! schedule into selected blocks and compresses a selection back into
//! maximal contiguous ranges.
//!
//! Blocks outside the configured [`Shifts`] are never produced by expansion,
//! so a schedule that reaches beyond the operating window is clipped to it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{ClockTime, TimeRange};
use crate::error::ScheduleError;
use crate::schedule::{WeekDay, WeeklySchedule};

/// Editing granularity used by the availability editor.
pub const DEFAULT_BLOCK_MINUTES: i64 = 30;

// ── Shifts ──────────────────────────────────────────────────────────────────

/// The fixed daily operating windows that bound which blocks can exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TimeRange>", into = "Vec<TimeRange>")]
pub struct Shifts(Vec<TimeRange>);

impl Default for Shifts {
    /// Morning 09:00-13:00 and afternoon 14:00-18:00.
    fn default() -> Self {
        Self(vec![
            TimeRange::whole_hours(9, 13),
            TimeRange::whole_hours(14, 18),
        ])
    }
}

impl TryFrom<Vec<TimeRange>> for Shifts {
    type Error = ScheduleError;

    fn try_from(ranges: Vec<TimeRange>) -> Result<Self, Self::Error> {
        Self::new(ranges)
    }
}

impl From<Shifts> for Vec<TimeRange> {
    fn from(shifts: Shifts) -> Self {
        shifts.0
    }
}

impl Shifts {
    /// # Errors
    ///
    /// Returns [`ScheduleError::Config`] if there are no shifts or two of
    /// them overlap.
    pub fn new(mut ranges: Vec<TimeRange>) -> Result<Self, ScheduleError> {
        if ranges.is_empty() {
            return Err(ScheduleError::Config("at least one shift is required".to_string()));
        }
        ranges.sort_by_key(|r| r.start());
        if let Some(pair) = ranges.windows(2).find(|pair| pair[0].overlaps(&pair[1])) {
            return Err(ScheduleError::Config(format!(
                "shifts {} and {} overlap",
                pair[0], pair[1]
            )));
        }
        Ok(Self(ranges))
    }

    pub fn ranges(&self) -> &[TimeRange] {
        &self.0
    }

    /// Check that `block_minutes` tiles every shift exactly.
    ///
    /// Shift starts must sit on the block grid and shift lengths must be a
    /// whole number of blocks.
    pub fn check_block_size(&self, block_minutes: i64) -> Result<u32, ScheduleError> {
        let step = block_step(block_minutes)?;
        for shift in &self.0 {
            if shift.start().minutes() % step != 0 {
                return Err(ScheduleError::Config(format!(
                    "shift {shift} does not start on a {step}-minute boundary"
                )));
            }
            if shift.duration_minutes() % step != 0 {
                return Err(ScheduleError::Config(format!(
                    "{step}-minute blocks do not evenly divide shift {shift}"
                )));
            }
        }
        Ok(step)
    }

    /// Every selectable block start, ascending.
    ///
    /// ```
    /// use slot_engine::codec::Shifts;
    ///
    /// let blocks = Shifts::default().candidate_blocks(30).unwrap();
    /// assert_eq!(blocks.len(), 16);
    /// assert_eq!(blocks[0].to_string(), "09:00");
    /// assert_eq!(blocks[15].to_string(), "17:30");
    /// ```
    pub fn candidate_blocks(&self, block_minutes: i64) -> Result<Vec<ClockTime>, ScheduleError> {
        let step = self.check_block_size(block_minutes)?;
        let blocks = self
            .0
            .iter()
            .flat_map(|shift| {
                (shift.start().minutes()..shift.end().minutes())
                    .step_by(step as usize)
                    .filter_map(ClockTime::from_minutes)
            })
            .collect();
        Ok(blocks)
    }
}

fn block_step(block_minutes: i64) -> Result<u32, ScheduleError> {
    if block_minutes <= 0 || block_minutes > 24 * 60 {
        return Err(ScheduleError::Config(format!(
            "block size must be between 1 and 1440 minutes, got {block_minutes}"
        )));
    }
    Ok(block_minutes as u32)
}

// ── BlockSelection ──────────────────────────────────────────────────────────

/// Selected editor blocks per business day.
///
/// This is the editor's working state. The caller owns it, mutates it as the
/// user clicks or drags across the grid, and hands it to
/// [`compress_to_ranges`] when saving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<WeekDay, BTreeSet<ClockTime>>",
    into = "BTreeMap<WeekDay, BTreeSet<ClockTime>>"
)]
pub struct BlockSelection {
    days: BTreeMap<WeekDay, BTreeSet<ClockTime>>,
}

impl From<BTreeMap<WeekDay, BTreeSet<ClockTime>>> for BlockSelection {
    fn from(mut days: BTreeMap<WeekDay, BTreeSet<ClockTime>>) -> Self {
        days.retain(|_, blocks| !blocks.is_empty());
        Self { days }
    }
}

impl From<BlockSelection> for BTreeMap<WeekDay, BTreeSet<ClockTime>> {
    fn from(selection: BlockSelection) -> Self {
        selection.days
    }
}

impl BlockSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a block selected. Returns `false` if it already was.
    pub fn select(&mut self, day: WeekDay, block: ClockTime) -> bool {
        self.days.entry(day).or_default().insert(block)
    }

    /// Clear a block. Returns `false` if it was not selected.
    pub fn deselect(&mut self, day: WeekDay, block: ClockTime) -> bool {
        let Some(blocks) = self.days.get_mut(&day) else {
            return false;
        };
        let removed = blocks.remove(&block);
        if blocks.is_empty() {
            self.days.remove(&day);
        }
        removed
    }

    /// Flip a block and return its new state.
    pub fn toggle(&mut self, day: WeekDay, block: ClockTime) -> bool {
        if self.deselect(day, block) {
            false
        } else {
            self.select(day, block)
        }
    }

    /// Select every grid block between `from` and `to` inclusive, as when
    /// the user drags across the grid. The drag may go in either direction.
    /// Returns how many blocks were newly selected.
    pub fn select_span(
        &mut self,
        day: WeekDay,
        from: ClockTime,
        to: ClockTime,
        grid: &[ClockTime],
    ) -> usize {
        let (low, high) = if from <= to { (from, to) } else { (to, from) };
        let mut added = 0;
        for &block in grid.iter().filter(|b| low <= **b && **b <= high) {
            if self.select(day, block) {
                added += 1;
            }
        }
        added
    }

    pub fn clear_day(&mut self, day: WeekDay) {
        self.days.remove(&day);
    }

    pub fn is_selected(&self, day: WeekDay, block: ClockTime) -> bool {
        self.days.get(&day).is_some_and(|blocks| blocks.contains(&block))
    }

    /// The day's selected blocks, ascending.
    pub fn blocks(&self, day: WeekDay) -> impl Iterator<Item = ClockTime> + '_ {
        self.days.get(&day).into_iter().flatten().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Total selected blocks across the week.
    pub fn len(&self) -> usize {
        self.days.values().map(BTreeSet::len).sum()
    }

    /// Parse the editor form, e.g. `{"monday":["09:00","09:30"]}`.
    pub fn from_json(json: &str) -> Result<Self, ScheduleError> {
        serde_json::from_str(json)
            .map_err(|e| ScheduleError::Format(format!("block selection: {e}")))
    }

    pub fn to_json(&self) -> Result<String, ScheduleError> {
        serde_json::to_string(self)
            .map_err(|e| ScheduleError::Format(format!("block selection: {e}")))
    }
}

// ── expand / compress ───────────────────────────────────────────────────────

/// Expand a schedule into editor blocks using the default [`Shifts`].
///
/// See [`expand_to_blocks_with`].
pub fn expand_to_blocks(
    schedule: &WeeklySchedule,
    block_minutes: i64,
) -> Result<BlockSelection, ScheduleError> {
    expand_to_blocks_with(schedule, block_minutes, &Shifts::default())
}

/// Expand a schedule into the set of grid blocks its ranges cover.
///
/// A block is selected when its start `b` satisfies `range.start <= b <
/// range.end` for some range of that day. Only blocks inside `shifts` can be
/// selected.
///
/// # Errors
///
/// Returns [`ScheduleError::Config`] if `block_minutes` is not positive or
/// does not tile the shifts.
///
/// # Examples
///
/// ```
/// use slot_engine::clock::TimeRange;
/// use slot_engine::codec::expand_to_blocks;
/// use slot_engine::schedule::{WeekDay, WeeklySchedule};
///
/// let schedule = WeeklySchedule::new()
///     .with_day(WeekDay::Tuesday, vec![TimeRange::parse("09:00", "10:00").unwrap()]);
/// let blocks = expand_to_blocks(&schedule, 30).unwrap();
/// let tuesday: Vec<String> = blocks.blocks(WeekDay::Tuesday).map(|b| b.to_string()).collect();
/// assert_eq!(tuesday, ["09:00", "09:30"]);
/// ```
pub fn expand_to_blocks_with(
    schedule: &WeeklySchedule,
    block_minutes: i64,
    shifts: &Shifts,
) -> Result<BlockSelection, ScheduleError> {
    let candidates = shifts.candidate_blocks(block_minutes)?;
    let mut selection = BlockSelection::new();

    for day in schedule.open_days() {
        for range in schedule.ranges(day) {
            for block in candidates.iter().filter(|b| range.contains(**b)) {
                selection.select(day, *block);
            }
        }
    }

    debug!(
        block_minutes,
        blocks = selection.len(),
        "expanded schedule into editor blocks"
    );
    Ok(selection)
}

/// Compress selected blocks into ranges using the default [`Shifts`].
///
/// See [`compress_to_ranges_with`].
pub fn compress_to_ranges(
    selection: &BlockSelection,
    block_minutes: i64,
) -> Result<WeeklySchedule, ScheduleError> {
    compress_to_ranges_with(selection, block_minutes, &Shifts::default())
}

/// Compress selected blocks into maximal contiguous ranges.
///
/// Blocks whose starts are exactly `block_minutes` apart join the same range;
/// any larger gap closes the range at `last_block + block_minutes`. A lone
/// block becomes a range of one block. Days with no blocks are left out.
///
/// # Errors
///
/// Returns [`ScheduleError::Config`] if `block_minutes` is not positive or
/// does not tile the shifts, and [`ScheduleError::Format`] for a block off
/// the `block_minutes` grid or outside every shift.
pub fn compress_to_ranges_with(
    selection: &BlockSelection,
    block_minutes: i64,
    shifts: &Shifts,
) -> Result<WeeklySchedule, ScheduleError> {
    let candidates: BTreeSet<ClockTime> =
        shifts.candidate_blocks(block_minutes)?.into_iter().collect();
    let step = block_step(block_minutes)?;
    let mut schedule = WeeklySchedule::new();

    for (day, blocks) in &selection.days {
        let mut ranges = Vec::new();
        let mut run: Option<(ClockTime, ClockTime)> = None;

        for &block in blocks {
            if block.minutes() % step != 0 {
                return Err(ScheduleError::Format(format!(
                    "{day} block {block} is not on the {step}-minute grid"
                )));
            }
            if !candidates.contains(&block) {
                return Err(ScheduleError::Format(format!(
                    "{day} block {block} is outside the operating shifts"
                )));
            }
            run = match run {
                Some((first, last)) if block.minutes() - last.minutes() == step => {
                    Some((first, block))
                }
                Some((first, last)) => {
                    ranges.push(close_run(*day, first, last, step)?);
                    Some((block, block))
                }
                None => Some((block, block)),
            };
        }
        if let Some((first, last)) = run {
            ranges.push(close_run(*day, first, last, step)?);
        }

        schedule.set_day(*day, ranges);
    }

    debug!(
        block_minutes,
        days = schedule.open_days().count(),
        "compressed editor blocks into ranges"
    );
    Ok(schedule)
}

fn close_run(
    day: WeekDay,
    first: ClockTime,
    last: ClockTime,
    step: u32,
) -> Result<TimeRange, ScheduleError> {
    let end = last.checked_add_minutes(step).ok_or_else(|| {
        ScheduleError::Format(format!("{day} block {last} runs past midnight"))
    })?;
    TimeRange::new(first, end)
}

// ── Tests ───────────────────────────────────────────────────────────────────
