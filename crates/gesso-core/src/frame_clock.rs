use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::error::GessoError;
use crate::runtime::{FrameCallbackId, RuntimeHandle, TaskResult, TimerId};

/// Paces work to a target rate on the cooperative runtime.
///
/// Scheduling is two-stage: a coarse delay timer gates a request for the
/// host's next frame ("ready to paint") signal. Hosts without a frame signal
/// fall back to a plain timer.
#[derive(Clone)]
pub struct FrameClock {
    runtime: RuntimeHandle,
}

impl FrameClock {
    pub fn new(runtime: RuntimeHandle) -> Self {
        Self { runtime }
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.clone()
    }

    /// Minimum wait between ticks at `rate` frames per second.
    pub fn frame_delay(rate: f64) -> Result<Duration, GessoError> {
        validate_rate(rate)?;
        Ok(Duration::from_secs_f64(1.0 / rate))
    }

    pub fn with_frame_nanos(
        &self,
        callback: impl FnOnce(u64) -> TaskResult + 'static,
    ) -> FrameCallbackRegistration {
        let stage = Rc::new(Cell::new(Stage::Done));
        let fired = stage.clone();
        let id = self.runtime.register_frame_callback(move |time| {
            fired.set(Stage::Done);
            callback(time)
        });
        if let Some(id) = id {
            stage.set(Stage::Frame(id));
        }
        FrameCallbackRegistration::new(self.runtime.clone(), stage)
    }

    pub fn with_frame_millis(
        &self,
        callback: impl FnOnce(u64) -> TaskResult + 'static,
    ) -> FrameCallbackRegistration {
        self.with_frame_nanos(move |nanos| callback(nanos / 1_000_000))
    }

    /// Runs `callback` on the first frame signal after `delay` has elapsed.
    pub fn schedule_after(
        &self,
        delay: Duration,
        callback: impl FnOnce(u64) -> TaskResult + 'static,
    ) -> FrameCallbackRegistration {
        let stage = Rc::new(Cell::new(Stage::Done));
        let runtime = self.runtime.clone();
        let timer_stage = stage.clone();
        let frame_sync = runtime.supports_frame_sync();
        let timer = self.runtime.set_timeout(delay, move || {
            if !frame_sync {
                timer_stage.set(Stage::Done);
                let now = runtime.now().as_nanos() as u64;
                return callback(now);
            }
            let frame_stage = timer_stage.clone();
            let id = runtime.register_frame_callback(move |time| {
                frame_stage.set(Stage::Done);
                callback(time)
            });
            timer_stage.set(id.map_or(Stage::Done, Stage::Frame));
            Ok(())
        });
        if let Some(id) = timer {
            stage.set(Stage::Timer(id));
        }
        FrameCallbackRegistration::new(self.runtime.clone(), stage)
    }
}

pub(crate) fn validate_rate(rate: f64) -> Result<(), GessoError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(GessoError::InvalidRate { rate })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Timer(TimerId),
    Frame(FrameCallbackId),
    Done,
}

/// Pending scheduled callback; cancelled on [`cancel`](Self::cancel) or drop.
pub struct FrameCallbackRegistration {
    runtime: RuntimeHandle,
    stage: Rc<Cell<Stage>>,
}

impl FrameCallbackRegistration {
    fn new(runtime: RuntimeHandle, stage: Rc<Cell<Stage>>) -> Self {
        Self { runtime, stage }
    }

    pub fn is_pending(&self) -> bool {
        self.stage.get() != Stage::Done
    }

    pub fn is_waiting_for_frame(&self) -> bool {
        matches!(self.stage.get(), Stage::Frame(_))
    }

    pub fn cancel(self) {
        // Drop does the work.
    }

    fn cancel_pending(&self) {
        match self.stage.replace(Stage::Done) {
            Stage::Timer(id) => self.runtime.cancel_timer(id),
            Stage::Frame(id) => self.runtime.cancel_frame_callback(id),
            Stage::Done => {}
        }
    }
}

impl Drop for FrameCallbackRegistration {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
