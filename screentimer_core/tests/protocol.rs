use rstest::rstest;
use screentimer_core::decoder::{ERROR_TERMINATOR, SUCCESS_TERMINATOR};
use screentimer_core::mocks::{ScriptedLink, measurement_script};
use screentimer_core::{ProtocolClient, ProtocolError, SessionState};
use screentimer_hardware::{SIM_RESOLUTION, SimFault, simulated_link};

fn ready(script: &[u8]) -> (ProtocolClient<ScriptedLink>, screentimer_core::mocks::LinkProbe) {
    let mut full = b"HELO ScreenTimer ready\n".to_vec();
    full.extend_from_slice(script);
    let link = ScriptedLink::new(full);
    let probe = link.probe();
    let mut client = ProtocolClient::new(link);
    client.handshake().expect("handshake");
    (client, probe)
}

#[rstest]
#[case(&b"BOOT\n"[..])]
#[case(&b"helo\n"[..])]
#[case(&b"\n"[..])]
#[case(&b"HEL\n"[..])]
fn greeting_must_start_with_helo(#[case] greeting: &[u8]) {
    let mut client = ProtocolClient::new(ScriptedLink::new(greeting));
    assert!(matches!(
        client.handshake(),
        Err(ProtocolError::UnexpectedGreeting { .. })
    ));
    assert_eq!(client.state(), SessionState::Failed);
}

#[test]
fn greeting_prefix_is_enough() {
    let mut client = ProtocolClient::new(ScriptedLink::new(b"HELO\n"));
    client.handshake().unwrap();
    assert_eq!(client.state(), SessionState::Ready);
}

#[test]
fn keys_are_sent_in_decimal() {
    let (mut client, probe) = ready(b"ACPT\n");
    client.configure_keys(4, 42).unwrap();
    assert_eq!(probe.written_str(), "K 4 42\n");
}

#[rstest]
#[case(&b"REJT\n"[..])]
#[case(&b"ACPT \n"[..])]
#[case(&b"ACPT\r\n"[..])]
fn keys_need_exact_accept(#[case] answer: &[u8]) {
    let (mut client, _) = ready(answer);
    assert!(matches!(
        client.configure_keys(4, 42),
        Err(ProtocolError::Rejected { command: "K", .. })
    ));
}

#[test]
fn info_reports_resolution() {
    let (mut client, probe) = ready(b"RESL 16000000UL\n");
    assert_eq!(client.query_info().unwrap().resolution, 16_000_000);
    assert_eq!(probe.written_str(), "I\n");
}

#[test]
fn info_rejects_other_prefix() {
    let (mut client, _) = ready(b"REJT\n");
    assert!(matches!(
        client.query_info(),
        Err(ProtocolError::MalformedInfo { .. })
    ));
}

#[test]
fn calibration_accumulates_deltas() {
    let (mut client, probe) = ready(b"CSTA\n10;40\n5;41\n0;39\nCSUC\n");
    let sample = client.calibrate().unwrap();
    assert_eq!(probe.written_str(), "C\n");
    assert_eq!(sample.times(), &[10.0, 15.0, 15.0]);
    assert_eq!(sample.values(), &[40, 41, 39]);
    assert_eq!(sample.variance(), 0);
}

#[test]
fn calibration_error_terminator() {
    let (mut client, _) = ready(b"CSTA\n10;40\nCERR\n");
    assert_eq!(client.calibrate(), Err(ProtocolError::CalibrationFailed));
}

#[test]
fn calibration_needs_start_marker() {
    let (mut client, _) = ready(b"MSTA\n");
    assert!(matches!(
        client.calibrate(),
        Err(ProtocolError::UnexpectedResponse {
            command: "C",
            expected: "CSTA\n",
            ..
        })
    ));
}

#[test]
fn calibration_rejects_bad_lines() {
    let (mut client, _) = ready(b"CSTA\n10-40\nCSUC\n");
    assert!(matches!(
        client.calibrate(),
        Err(ProtocolError::MalformedFrame { .. })
    ));
}

#[test]
fn measurement_decodes_frames_after_the_first() {
    let script = measurement_script(
        0x0102,
        &[(0x9000, 0), (100, 40), (50, 41), (0, 300)],
        SUCCESS_TERMINATOR,
    );
    let (mut client, probe) = ready(&script);
    let sample = client.measure().unwrap();
    assert_eq!(probe.written_str(), "M\n");
    assert_eq!(sample.variance(), 0x0102);
    assert_eq!(sample.times(), &[100.0, 150.0, 150.0]);
    assert_eq!(sample.values(), &[40, 41, 300]);
}

#[test]
fn measurement_with_only_the_startup_frame_is_empty() {
    let script = measurement_script(3, &[(7, 7)], SUCCESS_TERMINATOR);
    let (mut client, _) = ready(&script);
    let sample = client.measure().unwrap();
    assert!(sample.is_empty());
}

#[rstest]
#[case(vec![])]
#[case(vec![(1, 1), (2, 2), (3, 3)])]
fn error_terminator_fails_measurement(#[case] frames: Vec<(u16, u16)>) {
    let script = measurement_script(0, &frames, ERROR_TERMINATOR);
    let (mut client, _) = ready(&script);
    assert_eq!(
        client.measure(),
        Err(ProtocolError::MeasurementFailed {
            frames_received: frames.len()
        })
    );
}

#[test]
fn stream_ending_without_terminator_is_a_transport_error() {
    let mut script = measurement_script(0, &[(1, 1), (2, 2)], SUCCESS_TERMINATOR);
    script.truncate(script.len() - 4);
    let (mut client, _) = ready(&script);
    assert!(matches!(client.measure(), Err(ProtocolError::Transport(_))));
}

#[test]
fn silent_device_times_out() {
    let link = ScriptedLink::new(b"").timing_out();
    let mut client = ProtocolClient::new(link);
    assert_eq!(client.handshake(), Err(ProtocolError::Timeout));
}

#[test]
fn failed_session_refuses_further_commands() {
    let (mut client, probe) = ready(b"REJT\n");
    assert!(client.configure_keys(4, 42).is_err());
    let written = probe.written();
    assert_eq!(client.query_info(), Err(ProtocolError::SessionFailed));
    assert_eq!(client.measure(), Err(ProtocolError::SessionFailed));
    assert_eq!(probe.written(), written, "no bytes sent after failure");
}

#[test]
fn commands_before_handshake_are_out_of_sequence() {
    let link = ScriptedLink::new(b"HELO\n");
    let probe = link.probe();
    let mut client = ProtocolClient::new(link);
    assert_eq!(
        client.measure(),
        Err(ProtocolError::OutOfSequence {
            command: "M",
            state: SessionState::AwaitingGreeting
        })
    );
    assert!(probe.written().is_empty());
    // An out-of-sequence call does not poison the session
    client.handshake().unwrap();
    assert!(matches!(
        client.handshake(),
        Err(ProtocolError::OutOfSequence { command: "HELO", .. })
    ));
}

#[test]
fn link_is_closed_on_drop_after_failure() {
    let link = ScriptedLink::new(b"BOOT\n");
    let probe = link.probe();
    {
        let mut client = ProtocolClient::new(link);
        assert!(client.handshake().is_err());
        assert!(!probe.is_closed());
    }
    assert!(probe.is_closed());
}

#[test]
fn explicit_close_closes_once() {
    let (client, probe) = ready(b"");
    client.close().unwrap();
    assert_eq!(probe.close_calls(), 1);
}

#[rstest]
fn simulator_session_round_trip() {
    let mut client = ProtocolClient::new(simulated_link(SimFault::None, 11));
    client.handshake().unwrap();
    client.configure_keys(4, 42).unwrap();
    assert_eq!(client.query_info().unwrap().resolution, SIM_RESOLUTION);

    let cal = client.calibrate().unwrap();
    assert_eq!(cal.len(), 100);

    let sample = client.measure().unwrap();
    assert_eq!(sample.len(), 400);
    assert!(sample.times().windows(2).all(|w| w[0] <= w[1]));
    client.close().unwrap();
}

#[rstest]
#[case(SimFault::RejectKeys)]
#[case(SimFault::CalibrationError)]
#[case(SimFault::MeasurementError)]
#[case(SimFault::Truncated)]
fn simulator_faults_fail_the_session(#[case] fault: SimFault) {
    let mut client = ProtocolClient::new(simulated_link(fault, 3));
    client.handshake().unwrap();
    let result = client
        .configure_keys(4, 42)
        .and_then(|()| client.calibrate().map(drop))
        .and_then(|()| client.measure().map(drop));
    let err = result.unwrap_err();
    match fault {
        SimFault::RejectKeys => assert!(matches!(err, ProtocolError::Rejected { .. })),
        SimFault::CalibrationError => assert_eq!(err, ProtocolError::CalibrationFailed),
        SimFault::MeasurementError => assert_eq!(
            err,
            ProtocolError::MeasurementFailed {
                frames_received: 201
            }
        ),
        SimFault::Truncated => assert!(matches!(err, ProtocolError::Transport(_))),
        _ => unreachable!(),
    }
    assert_eq!(client.state(), SessionState::Failed);
}
