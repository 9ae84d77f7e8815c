/// Fixed-step accumulator deciding how many post-physics phases follow a rendered frame.
pub(crate) struct RuntimeLoop {
    accumulator: f32,
    fixed_dt: f32,
    max_backlog: f32,
}

impl RuntimeLoop {
    pub(crate) fn new(fixed_dt: f32, max_backlog: f32) -> Self {
        Self { accumulator: 0.0, fixed_dt: fixed_dt.max(f32::EPSILON), max_backlog }
    }

    /// Adds frame time, dropping anything beyond the backlog cap.
    pub(crate) fn advance(&mut self, dt: f32) -> Option<f32> {
        self.accumulator += dt.max(0.0);
        if self.accumulator > self.max_backlog {
            let dropped = self.accumulator - self.max_backlog;
            self.accumulator = self.max_backlog;
            return Some(dropped);
        }
        None
    }

    pub(crate) fn pop_fixed_step(&mut self) -> Option<f32> {
        if self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            Some(self.fixed_dt)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_frames_produce_no_step() {
        let mut runtime = RuntimeLoop::new(0.02, 0.1);
        runtime.advance(0.01);
        assert_eq!(runtime.pop_fixed_step(), None);
        runtime.advance(0.015);
        assert_eq!(runtime.pop_fixed_step(), Some(0.02));
        assert_eq!(runtime.pop_fixed_step(), None);
    }

    #[test]
    fn backlog_is_capped() {
        let mut runtime = RuntimeLoop::new(0.02, 0.05);
        let dropped = runtime.advance(1.0).expect("backlog dropped");
        assert!((dropped - 0.95).abs() < 1e-5);
        let mut steps = 0;
        while runtime.pop_fixed_step().is_some() {
            steps += 1;
        }
        assert_eq!(steps, 2);
    }
}
