//! Retransmission timer. Kept as an explicit object: RTO, elapsed time and
//! the running flag are all separate fields, rather than encoding expiry as
//! "elapsed went negative", matching the original C++ `Timer` in
//! `tcp_sender.hh` field-for-field.

#[derive(Debug)]
pub struct Timer {
    initial_rto_ms: u64,
    current_rto_ms: u64,
    elapsed_ms: u64,
    running: bool,
}

impl Timer {
    pub fn new(initial_rto_ms: u64) -> Self {
        Timer {
            initial_rto_ms,
            current_rto_ms: initial_rto_ms,
            elapsed_ms: 0,
            running: false,
        }
    }

    pub fn run(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn restart(&mut self) {
        self.running = true;
        self.elapsed_ms = 0;
    }

    pub fn elapse(&mut self, dt_ms: u64) {
        if self.running {
            self.elapsed_ms += dt_ms;
        }
    }

    pub fn expired(&self) -> bool {
        self.running && self.elapsed_ms >= self.current_rto_ms
    }

    /// `k == 0` resets to the initial RTO; otherwise multiplies the current
    /// RTO by `k`.
    pub fn set_rto_by_factor(&mut self, k: u32) {
        if k == 0 {
            self.current_rto_ms = self.initial_rto_ms;
        } else {
            self.current_rto_ms *= k as u64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_once_elapsed_reaches_rto() {
        let mut t = Timer::new(100);
        t.run();
        t.elapse(99);
        assert!(!t.expired());
        t.elapse(1);
        assert!(t.expired());
    }

    #[test]
    fn back_off_doubles_and_reset_restores_initial() {
        let mut t = Timer::new(100);
        t.set_rto_by_factor(2);
        t.run();
        t.elapse(150);
        assert!(!t.expired());
        t.elapse(50);
        assert!(t.expired());
        t.set_rto_by_factor(0);
        t.restart();
        t.elapse(100);
        assert!(t.expired());
    }

    #[test]
    fn stopped_timer_never_elapses() {
        let mut t = Timer::new(50);
        t.elapse(1000);
        assert!(!t.expired());
    }
}
