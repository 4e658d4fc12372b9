use std::io;

use crate::utils::clock::Clock;

use super::{
    entities::{Timer, TimerState},
    error::TimerError,
    input::InputProvider,
    report::Reporter,
    store::TimerStore,
    view::{LabelView, ViewFormat},
};

/// A single request coming from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Create(String),
    Start(String),
    End(String),
    Resume(String),
    Delete(String),
    View(Vec<String>),
}

/// What [TimerEngine::apply] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(Timer),
    Started(Timer),
    Ended(Timer),
    Resumed(Timer),
    Deleted(Timer),
    /// Delete was requested for a label without timers.
    NothingToDelete,
    Viewed(Vec<LabelView>),
}

/// Applies operations to a [TimerStore] following the timer lifecycle:
/// pending -> running -> finished, with resume starting a fresh timer after a finished one.
///
/// Every check happens before the store is touched, so a failed operation leaves it as it was.
pub struct TimerEngine<C: Clock, R: Reporter> {
    clock: C,
    reporter: R,
    format: ViewFormat,
}

impl<C: Clock, R: Reporter> TimerEngine<C, R> {
    pub fn new(clock: C, reporter: R) -> Self {
        Self {
            clock,
            reporter,
            format: ViewFormat::default(),
        }
    }

    pub fn with_format(self, format: ViewFormat) -> Self {
        Self { format, ..self }
    }

    pub fn apply(
        &self,
        store: &mut TimerStore,
        operation: Operation,
        input: &mut impl InputProvider,
    ) -> Result<Outcome, TimerError> {
        match operation {
            Operation::Create(label) => self.create(store, &label).map(Outcome::Created),
            Operation::Start(label) => self.start(store, &label).map(Outcome::Started),
            Operation::End(label) => self.end(store, &label).map(Outcome::Ended),
            Operation::Resume(label) => self.resume(store, &label).map(Outcome::Resumed),
            Operation::Delete(label) => Ok(self
                .delete(store, &label, input)?
                .map_or(Outcome::NothingToDelete, Outcome::Deleted)),
            Operation::View(labels) => self.view(store, &labels).map(Outcome::Viewed),
        }
    }

    /// Adds a new pending timer. Only allowed once the previous timer of the label has finished.
    pub fn create(&self, store: &mut TimerStore, label: &str) -> Result<Timer, TimerError> {
        if let Some(latest) = store.latest(label) {
            if latest.state() != TimerState::Finished {
                return Err(TimerError::Conflict {
                    label: label.into(),
                    id: latest.id,
                });
            }
        }

        let timer = Timer::new(next_id(store, label), label, self.clock.time());
        store.push(timer.clone());
        let message = format!("Created new timer: {}; id: {}", timer.label, timer.id);
        self.reporter.info(&message);
        Ok(timer)
    }

    pub fn start(&self, store: &mut TimerStore, label: &str) -> Result<Timer, TimerError> {
        let latest = store.latest(label).ok_or_else(|| not_found(label))?;

        if latest.end.is_some() {
            // Not fatal on its own, a stopped timer also fails the check below.
            let message = format!("Cannot start timer {} as it was stopped", latest.label);
            self.reporter.warn(&message);
        }
        if latest.start.is_some() {
            return Err(invalid_state(latest, "has already started"));
        }

        let now = self.clock.time();
        let timer = store.latest_mut(label).ok_or_else(|| not_found(label))?;
        timer.start = Some(now);
        let message = format!("Started timer: {}; id: {}", timer.label, timer.id);
        self.reporter.info(&message);
        Ok(timer.clone())
    }

    pub fn end(&self, store: &mut TimerStore, label: &str) -> Result<Timer, TimerError> {
        let latest = store.latest(label).ok_or_else(|| not_found(label))?;

        match latest.state() {
            TimerState::Pending => return Err(invalid_state(latest, "was not started")),
            TimerState::Finished => return Err(invalid_state(latest, "has already stopped")),
            TimerState::Running => {}
        }

        let now = self.clock.time();
        let timer = store.latest_mut(label).ok_or_else(|| not_found(label))?;
        timer.end = Some(now);
        let message = format!("Stopped timer: {}; id: {}", timer.label, timer.id);
        self.reporter.info(&message);
        Ok(timer.clone())
    }

    /// Continues tracking a label by adding a new running timer after a finished one. The
    /// finished timer itself is never reopened.
    pub fn resume(&self, store: &mut TimerStore, label: &str) -> Result<Timer, TimerError> {
        let latest = store.latest(label).ok_or_else(|| not_found(label))?;

        match latest.state() {
            TimerState::Pending => return Err(invalid_state(latest, "was not started")),
            TimerState::Running => return Err(invalid_state(latest, "was not yet stopped")),
            TimerState::Finished => {}
        }

        let now = self.clock.time();
        let timer = Timer::new(next_id(store, label), label, now).with_start(now);
        store.push(timer.clone());
        let message = format!("Resumed timer for: {}; id: {}", timer.label, timer.id);
        self.reporter.info(&message);
        Ok(timer)
    }

    /// Lets the user pick one of the label's timers and removes it. Keeps asking until a valid
    /// position is given. Returns [None] if the label has no timers.
    pub fn delete(
        &self,
        store: &mut TimerStore,
        label: &str,
        input: &mut impl InputProvider,
    ) -> Result<Option<Timer>, TimerError> {
        let count = store.timers(label).len();
        if count == 0 {
            self.reporter.info(&format!("No timers to delete for label {label}"));
            return Ok(None);
        }

        let now = self.clock.time();
        let listing = LabelView::new(label, store.timers(label), now, &self.format)?;
        let mut message = format!("{listing}\nSelect timer to delete [1-{count}]: ");

        let index = loop {
            let answer = input
                .prompt(&message)
                .map_err(TimerError::Input)?
                .ok_or_else(|| {
                    TimerError::Input(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "input closed before a timer was selected",
                    ))
                })?;

            match answer.trim().parse::<usize>() {
                Ok(position) if (1..=count).contains(&position) => break position - 1,
                _ => {
                    message = format!("Enter a number between 1 and {count}: ");
                }
            }
        };

        let removed = store.remove(label, index).ok_or_else(|| not_found(label))?;
        let message = format!("Deleted timer: {}; id: {}", removed.label, removed.id);
        self.reporter.info(&message);
        Ok(Some(removed))
    }

    /// The timer start/end/resume act upon.
    pub fn latest<'a>(&self, store: &'a TimerStore, label: &str) -> Option<&'a Timer> {
        store.latest(label)
    }

    pub fn list<'a>(&self, store: &'a TimerStore, label: &str) -> &'a [Timer] {
        store.timers(label)
    }

    pub fn view(
        &self,
        store: &TimerStore,
        labels: &[String],
    ) -> Result<Vec<LabelView>, TimerError> {
        let now = self.clock.time();
        labels
            .iter()
            .map(|label| LabelView::new(label, store.timers(label), now, &self.format))
            .collect()
    }
}

/// Ids count every timer of the label that currently exists.
fn next_id(store: &TimerStore, label: &str) -> u32 {
    store.timers(label).len() as u32 + 1
}

fn not_found(label: &str) -> TimerError {
    TimerError::NotFound {
        label: label.into(),
    }
}

fn invalid_state(timer: &Timer, reason: &'static str) -> TimerError {
    TimerError::InvalidState {
        label: timer.label.clone(),
        id: timer.id,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, io};

    use anyhow::Result;
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

    use crate::{
        timers::{
            entities::{Timer, TimerState},
            error::TimerError,
            input::MockInputProvider,
            record_file::{read_timers, write_timers},
            report::{RecordingReporter, ReportLevel},
            store::TimerStore,
            view::ViewFormat,
        },
        utils::{
            clock::{Clock, MockClock},
            time::{format_duration, format_local_time},
        },
    };

    use super::{Operation, Outcome, TimerEngine};

    const TEST_START_DATE: NaiveDateTime = NaiveDateTime::new(
        NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(),
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    );

    /// Every call moves time forward by a minute.
    struct TestClock {
        current: Cell<NaiveDateTime>,
    }

    impl TestClock {
        fn new() -> Self {
            Self {
                current: Cell::new(TEST_START_DATE),
            }
        }
    }

    impl Clock for TestClock {
        fn time(&self) -> NaiveDateTime {
            let now = self.current.get();
            self.current.set(now + Duration::minutes(1));
            now
        }
    }

    fn test_engine(reporter: &RecordingReporter) -> TimerEngine<TestClock, &RecordingReporter> {
        TimerEngine::new(TestClock::new(), reporter)
    }

    /// Input that should never be asked anything.
    fn no_input() -> MockInputProvider {
        let mut input = MockInputProvider::new();
        input.expect_prompt().never();
        input
    }

    fn scripted_input(answers: &[&str]) -> MockInputProvider {
        let mut answers = answers
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .into_iter();
        let mut input = MockInputProvider::new();
        input
            .expect_prompt()
            .returning(move |_| Ok(answers.next()));
        input
    }

    fn finished_store(engine: &TimerEngine<TestClock, &RecordingReporter>) -> Result<TimerStore> {
        let mut store = TimerStore::new();
        engine.create(&mut store, "write")?;
        engine.start(&mut store, "write")?;
        engine.end(&mut store, "write")?;
        Ok(store)
    }

    #[test]
    fn test_create_start_end() -> Result<()> {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let mut store = TimerStore::new();

        let created = engine.create(&mut store, "write")?;
        assert_eq!(created.id, 1);
        assert_eq!(created.state(), TimerState::Pending);

        let started = engine.start(&mut store, "write")?;
        assert_eq!(started.state(), TimerState::Running);

        let ended = engine.end(&mut store, "write")?;
        assert_eq!(ended.state(), TimerState::Finished);
        assert!(ended.end >= ended.start);

        assert_eq!(store.timers("write"), &[ended]);
        assert_eq!(reporter.messages(ReportLevel::Info).len(), 3);
        Ok(())
    }

    #[test]
    fn test_view_after_finishing() -> Result<()> {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let store = finished_store(&engine)?;
        let timer = &store.timers("write")[0];
        let (start, end) = (timer.start.unwrap(), timer.end.unwrap());

        let views = engine.view(&store, &["write".to_string()])?;
        assert_eq!(views.len(), 1);
        let line = &views[0].lines[0];

        assert_eq!(line.position, 1);
        assert_eq!(Some(line.start.clone()), format_local_time(start, "%H:%M:%S"));
        assert_eq!(Some(line.end.clone()), format_local_time(end, "%H:%M:%S"));
        assert_eq!(line.elapsed, Some(format_duration(end - start, "%H:%M:%S")));
        assert!(!views[0].to_string().contains("not started"));
        Ok(())
    }

    #[test]
    fn test_start_missing_label() {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let mut store = TimerStore::new();

        let result = engine.start(&mut store, "ghost");
        assert!(matches!(result, Err(TimerError::NotFound { .. })));
        assert!(result.is_err_and(|e| e.is_precondition()));
        assert_eq!(store, TimerStore::new());
    }

    #[test]
    fn test_create_conflict() -> Result<()> {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let mut store = TimerStore::new();

        engine.create(&mut store, "x")?;
        let result = engine.create(&mut store, "x");
        assert!(matches!(result, Err(TimerError::Conflict { id: 1, .. })));
        assert_eq!(store.timers("x").len(), 1);

        engine.start(&mut store, "x")?;
        assert!(matches!(
            engine.create(&mut store, "x"),
            Err(TimerError::Conflict { .. })
        ));
        assert_eq!(store.timers("x").len(), 1);
        Ok(())
    }

    #[test]
    fn test_create_after_finish_counts_existing_timers() -> Result<()> {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let mut store = finished_store(&engine)?;

        assert_eq!(engine.create(&mut store, "other")?.id, 1);
        assert_eq!(engine.create(&mut store, "write")?.id, 2);
        Ok(())
    }

    #[test]
    fn test_start_invalid_states() -> Result<()> {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let mut store = TimerStore::new();
        engine.create(&mut store, "write")?;
        engine.start(&mut store, "write")?;

        let before = store.clone();
        assert!(matches!(
            engine.start(&mut store, "write"),
            Err(TimerError::InvalidState { .. })
        ));
        assert!(reporter.messages(ReportLevel::Warn).is_empty());

        engine.end(&mut store, "write")?;
        assert_ne!(store, before);
        let before = store.clone();
        assert!(matches!(
            engine.start(&mut store, "write"),
            Err(TimerError::InvalidState { .. })
        ));
        assert_eq!(store, before);
        assert_eq!(
            reporter.messages(ReportLevel::Warn),
            vec!["Cannot start timer write as it was stopped".to_string()]
        );
        Ok(())
    }

    #[test]
    fn test_end_invalid_states() -> Result<()> {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let mut store = TimerStore::new();

        assert!(matches!(
            engine.end(&mut store, "write"),
            Err(TimerError::NotFound { .. })
        ));
        engine.create(&mut store, "write")?;
        assert!(matches!(
            engine.end(&mut store, "write"),
            Err(TimerError::InvalidState { .. })
        ));
        engine.start(&mut store, "write")?;
        engine.end(&mut store, "write")?;
        assert!(matches!(
            engine.end(&mut store, "write"),
            Err(TimerError::InvalidState { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_resume_invalid_states() -> Result<()> {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let mut store = TimerStore::new();

        assert!(matches!(
            engine.resume(&mut store, "write"),
            Err(TimerError::NotFound { .. })
        ));
        engine.create(&mut store, "write")?;
        assert!(matches!(
            engine.resume(&mut store, "write"),
            Err(TimerError::InvalidState { .. })
        ));
        engine.start(&mut store, "write")?;
        assert!(matches!(
            engine.resume(&mut store, "write"),
            Err(TimerError::InvalidState { .. })
        ));
        assert_eq!(store.timers("write").len(), 1);
        Ok(())
    }

    #[test]
    fn test_resume_produces_ordered_intervals() -> Result<()> {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let mut store = finished_store(&engine)?;

        let resumed = engine.resume(&mut store, "write")?;
        assert_eq!(resumed.id, 2);
        assert_eq!(resumed.state(), TimerState::Running);
        assert_eq!(resumed.start, Some(resumed.created_at));
        engine.end(&mut store, "write")?;

        let timers = store.timers("write");
        assert_eq!(timers.len(), 2);
        assert!(timers.iter().all(|v| v.state() == TimerState::Finished));
        assert!(timers[0].id < timers[1].id);
        assert!(timers[0].start < timers[0].end);
        assert!(timers[0].end <= timers[1].start);
        assert!(timers[1].start < timers[1].end);
        Ok(())
    }

    #[test]
    fn test_delete_selected_timer() -> Result<()> {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let mut store = finished_store(&engine)?;
        engine.resume(&mut store, "write")?;
        engine.create(&mut store, "read")?;
        let read_before = store.timers("read").to_vec();

        let mut input = scripted_input(&["0", "abc", "7", " 1 "]);
        let removed = engine.delete(&mut store, "write", &mut input)?;

        assert_eq!(removed.map(|v| v.id), Some(1));
        assert_eq!(store.timers("write").len(), 1);
        assert_eq!(store.timers("write")[0].id, 2);
        assert_eq!(store.timers("read"), read_before.as_slice());
        Ok(())
    }

    #[test]
    fn test_delete_prompts_with_listing_then_hint() -> Result<()> {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let mut store = finished_store(&engine)?;

        let mut input = MockInputProvider::new();
        let mut sequence = mockall::Sequence::new();
        input
            .expect_prompt()
            .withf(|message| message.starts_with("write\n1. ") && message.ends_with("[1-1]: "))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(Some("2".into())));
        input
            .expect_prompt()
            .withf(|message| message.starts_with("Enter a number between 1 and 1"))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(Some("1".into())));

        engine.delete(&mut store, "write", &mut input)?;
        Ok(())
    }

    #[test]
    fn test_delete_only_timer_keeps_label() -> Result<()> {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let mut store = TimerStore::new();
        engine.create(&mut store, "write")?;

        engine.delete(&mut store, "write", &mut scripted_input(&["1"]))?;
        assert!(store.contains_label("write"));
        assert!(store.timers("write").is_empty());

        // The label is still around, but there is nothing to pick from.
        assert_eq!(engine.delete(&mut store, "write", &mut no_input())?, None);
        assert_eq!(engine.create(&mut store, "write")?.id, 1);
        Ok(())
    }

    #[test]
    fn test_delete_missing_label_is_noop() -> Result<()> {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let mut store = finished_store(&engine)?;
        let before = store.clone();

        let outcome = engine.apply(
            &mut store,
            Operation::Delete("ghost".into()),
            &mut no_input(),
        )?;
        assert_eq!(outcome, Outcome::NothingToDelete);
        assert_eq!(store, before);
        Ok(())
    }

    #[test]
    fn test_delete_closed_input() -> Result<()> {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let mut store = finished_store(&engine)?;
        let before = store.clone();

        let result = engine.delete(&mut store, "write", &mut scripted_input(&["nope"]));
        assert!(matches!(
            result,
            Err(TimerError::Input(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof
        ));
        assert_eq!(store, before);
        Ok(())
    }

    #[test]
    fn test_apply_dispatches() -> Result<()> {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let mut store = TimerStore::new();
        let mut input = no_input();

        let outcome = engine.apply(&mut store, Operation::Create("write".into()), &mut input)?;
        assert!(matches!(outcome, Outcome::Created(Timer { id: 1, .. })));
        let outcome = engine.apply(&mut store, Operation::Start("write".into()), &mut input)?;
        assert!(matches!(outcome, Outcome::Started(_)));
        let outcome = engine.apply(&mut store, Operation::End("write".into()), &mut input)?;
        assert!(matches!(outcome, Outcome::Ended(_)));
        let outcome = engine.apply(&mut store, Operation::Resume("write".into()), &mut input)?;
        assert!(matches!(outcome, Outcome::Resumed(Timer { id: 2, .. })));

        let outcome = engine.apply(
            &mut store,
            Operation::View(vec!["write".into(), "ghost".into()]),
            &mut input,
        )?;
        let Outcome::Viewed(views) = outcome else {
            panic!("Expected views, got {outcome:?}");
        };
        assert_eq!(views[0].lines.len(), 2);
        assert!(views[0].lines[1].to_string().contains("ongoing"));
        assert!(views[1].lines.is_empty());
        Ok(())
    }

    #[test]
    fn test_view_uses_engine_format_and_clock() -> Result<()> {
        let mut clock = MockClock::new();
        clock.expect_time().returning(|| TEST_START_DATE + Duration::hours(30));
        let reporter = RecordingReporter::default();
        let format = ViewFormat::new("%H:%M", "%D %H:%M")?;
        let engine = TimerEngine::new(clock, &reporter).with_format(format);

        let timer = Timer::new(1, "write", TEST_START_DATE).with_start(TEST_START_DATE);
        let store: TimerStore = [timer].into_iter().collect();
        let views = engine.view(&store, &["write".to_string()])?;
        assert_eq!(views[0].lines[0].to_string(), "1. 09:00 - ongoing (01 06:00)");
        assert_eq!(engine.latest(&store, "write").map(|v| v.id), Some(1));
        assert_eq!(engine.list(&store, "write").len(), 1);
        Ok(())
    }

    #[test]
    fn test_operations_survive_persistence() -> Result<()> {
        let reporter = RecordingReporter::default();
        let engine = test_engine(&reporter);
        let mut store = finished_store(&engine)?;
        engine.resume(&mut store, "write")?;
        engine.create(&mut store, "read")?;

        let mut buffer = Vec::new();
        write_timers(&store, &mut buffer)?;
        let mut loaded = read_timers(buffer.as_slice(), &reporter)?;
        assert_eq!(loaded, store);

        engine.end(&mut loaded, "write")?;
        engine.start(&mut loaded, "read")?;
        let mut second = Vec::new();
        write_timers(&loaded, &mut second)?;
        assert_eq!(read_timers(second.as_slice(), &reporter)?, loaded);
        Ok(())
    }
}
