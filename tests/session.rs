mod tests {
    use arena_handler::{
        Arena, DeviceError, DeviceSession, DryRunSession, Duration, LinkConfig, LinkTimings,
        TransmitReport, generate, transmit,
    };

    const NO_DELAYS: LinkTimings = LinkTimings {
        settle: Duration::from_ticks(0),
        message_delay: Duration::from_ticks(0),
        read_timeout: Duration::from_millis(100),
    };

    /// Session failing the send at position `fail_at`.
    struct Flaky {
        fail_at: usize,
        fatal: bool,
        calls: usize,
        opened: usize,
        closed: usize,
    }

    impl Flaky {
        fn new(fail_at: usize, fatal: bool) -> Self {
            Self {
                fail_at,
                fatal,
                calls: 0,
                opened: 0,
                closed: 0,
            }
        }
    }

    impl DeviceSession for Flaky {
        fn open(&mut self, _link: &LinkConfig) -> Result<(), DeviceError> {
            self.opened += 1;
            Ok(())
        }

        fn send(&mut self, _instruction: &str) -> Result<String, DeviceError> {
            let call = self.calls;
            self.calls += 1;
            if call != self.fail_at {
                Ok("ok\n".to_owned())
            } else if self.fatal {
                Err(closed())
            } else {
                Err(timeout())
            }
        }

        fn close(&mut self) {
            self.closed += 1;
        }
    }

    struct Unplugged;

    impl DeviceSession for Unplugged {
        fn open(&mut self, link: &LinkConfig) -> Result<(), DeviceError> {
            Err(DeviceError::Open {
                port: link.port.clone(),
                reason: "no such device".into(),
            })
        }

        fn send(&mut self, _instruction: &str) -> Result<String, DeviceError> {
            unreachable!("send on a session that never opened")
        }

        fn close(&mut self) {}
    }

    fn link() -> LinkConfig {
        LinkConfig::new("/dev/null", 57_600).with_timings(NO_DELAYS)
    }

    fn timeout() -> DeviceError {
        DeviceError::Timeout(core::time::Duration::from_secs(5))
    }

    fn closed() -> DeviceError {
        DeviceError::Closed
    }

    #[test]
    fn test_dry_run_keeps_instructions_in_order() {
        let snapshot = generate(&Arena::new(2, 2, 4, "RED"));
        let mut session = DryRunSession::instant();
        let report = transmit(&mut session, &link(), &snapshot);
        assert_eq!(
            report,
            TransmitReport {
                sent: 4,
                failed: 0,
                skipped: 0
            }
        );
        assert_eq!(session.sent(), snapshot.wire().as_slice());
        assert!(!session.is_open());
    }

    #[test]
    fn test_dry_run_rejects_send_when_closed() {
        let mut session = DryRunSession::instant();
        assert!(matches!(session.send("{}"), Err(DeviceError::Closed)));
    }

    #[test]
    fn test_dry_run_times_out_past_read_timeout() {
        let snapshot = generate(&Arena::new(2, 2, 4, "RED"));
        let mut session = DryRunSession::instant().with_latency(Duration::from_millis(150));
        let report = transmit(&mut session, &link(), &snapshot);
        assert_eq!(report.sent, 0);
        assert_eq!(report.failed, 4);
        assert_eq!(report.skipped, 0);
        assert_eq!(session.sent().len(), 4);

        session.open(&link()).unwrap();
        assert!(matches!(
            session.send("{}"),
            Err(DeviceError::Timeout(after)) if after == core::time::Duration::from_millis(100)
        ));
    }

    #[test]
    fn test_dry_run_answers_within_read_timeout() {
        let snapshot = generate(&Arena::new(2, 2, 4, "RED"));
        let mut session = DryRunSession::new().with_latency(Duration::from_millis(1));
        let report = transmit(&mut session, &link(), &snapshot);
        assert_eq!(report.sent, 4);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn test_recoverable_error_continues() {
        let snapshot = generate(&Arena::new(2, 2, 4, "RED"));
        let mut session = Flaky::new(1, false);
        let report = transmit(&mut session, &link(), &snapshot);
        assert_eq!(report.sent, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!((session.opened, session.closed), (1, 1));
    }

    #[test]
    fn test_unusable_session_fails_fast() {
        let snapshot = generate(&Arena::new(2, 2, 4, "RED"));
        let mut session = Flaky::new(1, true);
        let report = transmit(&mut session, &link(), &snapshot);
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(session.calls, 2);
        assert_eq!(session.closed, 1);
    }

    #[test]
    fn test_open_failure_skips_snapshot() {
        let snapshot = generate(&Arena::new(2, 2, 4, "RED"));
        let report = transmit(&mut Unplugged, &link(), &snapshot);
        assert_eq!(report.sent, 0);
        assert_eq!(report.skipped, 4);
    }

    #[test]
    fn test_error_recoverability() {
        assert!(timeout().is_recoverable());
        assert!(DeviceError::Write("short write".into()).is_recoverable());
        assert!(!closed().is_recoverable());
    }
}
