mod common;

use common::*;
use nextdiff::acme::WinInfo;
use nextdiff::config::DEFAULT_SEARCH_PATTERN;
use nextdiff::error::{BootstrapError, NavigateError, ShowError, StartupError};
use nextdiff::location::ParseError;
use nextdiff::{run, Dispatch, Error};

const LINE: &str = "/tmp/a.txt:1,2 c /tmp/b.txt:1";

fn win(id: u32, name: &str) -> WinInfo {
  WinInfo { id, name: name.to_string() }
}

#[test]
fn test_no_open_windows_plumbs_both_files() {
  let acme = FakeAcme::new(LINE);
  let plumber = FakePlumber::new(&acme);

  let dispatched = run(&invocation("/home/glenda"), &acme, &plumber).unwrap();

  assert_eq!(dispatched, vec![Dispatch::Open, Dispatch::Open]);
  let sent = plumber.sent();
  assert_eq!(sent.len(), 2);
  assert_eq!(sent[0].data, b"/tmp/a.txt");
  assert_eq!(sent[0].attr("addr"), Some("1,2"));
  assert_eq!(sent[1].data, b"/tmp/b.txt");
  assert_eq!(sent[1].attr("addr"), Some("1"));

  for msg in &sent {
    assert_eq!(msg.src, "NextDiff");
    assert_eq!(msg.dst, "edit");
    assert_eq!(msg.wdir, "/home/glenda");
    assert_eq!(msg.kind, "text");
  }
}

#[test]
fn test_open_window_is_retargeted_not_plumbed() {
  let acme = FakeAcme::new(LINE).with_window(5, "/tmp/a.txt");
  let plumber = FakePlumber::new(&acme);

  let dispatched = run(&invocation("/home/glenda"), &acme, &plumber).unwrap();

  assert_eq!(dispatched, vec![Dispatch::Retarget(win(5, "/tmp/a.txt")), Dispatch::Open]);

  let calls = acme.calls();
  let retarget = [
    Call::Windows,
    Call::Open(5),
    Call::WriteAddr(5, "1,2".to_string()),
    Call::Ctl(5, "dot=addr".to_string()),
    Call::Ctl(5, "show".to_string()),
    Call::Close(5),
    Call::Windows,
    plumbed("/tmp/b.txt", "1"),
  ];
  assert!(calls.ends_with(&retarget), "unexpected calls: {:#?}", calls);
  assert!(!calls.contains(&plumbed("/tmp/a.txt", "1,2")));
}

#[test]
fn test_both_windows_open() {
  let acme = FakeAcme::new(LINE).with_window(5, "/tmp/a.txt").with_window(6, "/tmp/b.txt");
  let plumber = FakePlumber::new(&acme);

  let dispatched = run(&invocation("/"), &acme, &plumber).unwrap();

  assert_eq!(dispatched, vec![Dispatch::Retarget(win(5, "/tmp/a.txt")), Dispatch::Retarget(win(6, "/tmp/b.txt"))]);
  assert!(plumber.sent().is_empty());
  assert!(acme.calls().contains(&Call::WriteAddr(6, "1".to_string())));
}

#[test]
fn test_first_matching_window_wins() {
  let acme = FakeAcme::new(LINE).with_window(5, "/tmp/a.txt").with_window(8, "/tmp/a.txt");
  let plumber = FakePlumber::new(&acme);

  let dispatched = run(&invocation("/"), &acme, &plumber).unwrap();

  assert_eq!(dispatched[0], Dispatch::Retarget(win(5, "/tmp/a.txt")));
  assert!(!acme.calls().contains(&Call::Open(8)));
}

#[test]
fn test_missing_addresses_navigate_nothing() {
  let acme = FakeAcme::new("a.txt b.txt");
  let plumber = FakePlumber::new(&acme);

  let err = run(&invocation("/home/glenda"), &acme, &plumber).unwrap_err();

  assert!(matches!(err, Error::Parse(ParseError::MalformedLine(_))), "got {:?}", err);
  let calls = acme.calls();
  assert!(!calls.contains(&Call::Windows));
  assert!(!calls.iter().any(|call| matches!(call, Call::Plumb { .. })));
  assert_eq!(calls.last(), Some(&Call::Close(CONTROL_WINID)));
}

#[test]
fn test_missing_winid_fails_before_anything_else() {
  let acme = FakeAcme::new(LINE);
  let plumber = FakePlumber::new(&acme);
  let mut invocation = invocation("/home/glenda");
  invocation.winid = None;

  let err = run(&invocation, &acme, &plumber).unwrap_err();

  assert!(matches!(err, Error::Startup(StartupError::MissingWinId)), "got {:?}", err);
  assert!(acme.calls().is_empty());
}

#[test]
fn test_non_numeric_winid_is_a_startup_error() {
  let acme = FakeAcme::new(LINE);
  let plumber = FakePlumber::new(&acme);
  let mut invocation = invocation("/home/glenda");
  invocation.winid = Some("acme".to_string());

  let err = run(&invocation, &acme, &plumber).unwrap_err();

  assert!(matches!(err, Error::Startup(StartupError::InvalidWinId(_))), "got {:?}", err);
  assert!(acme.calls().is_empty());
}

#[test]
fn test_control_window_failure_is_a_startup_error() {
  let acme = FakeAcme::new(LINE).failing_on(Call::Open(CONTROL_WINID));
  let plumber = FakePlumber::new(&acme);

  let err = run(&invocation("/"), &acme, &plumber).unwrap_err();

  assert!(matches!(err, Error::Startup(StartupError::OpenControl { id: CONTROL_WINID, .. })), "got {:?}", err);
  assert_eq!(acme.calls(), vec![Call::Open(CONTROL_WINID)]);
}

#[test]
fn test_bootstrap_sequence_and_control_window_release() {
  let acme = FakeAcme::new(LINE);
  let plumber = FakePlumber::new(&acme);

  run(&invocation("/"), &acme, &plumber).unwrap();

  let calls = acme.calls();
  assert_eq!(&calls[..8], &[
    Call::Open(CONTROL_WINID),
    Call::ReadAddr(CONTROL_WINID),
    Call::Ctl(CONTROL_WINID, "addr=dot".to_string()),
    Call::WriteAddr(CONTROL_WINID, DEFAULT_SEARCH_PATTERN.to_string()),
    Call::Ctl(CONTROL_WINID, "dot=addr".to_string()),
    Call::Ctl(CONTROL_WINID, "show".to_string()),
    Call::ReadXdata(CONTROL_WINID),
    Call::Close(CONTROL_WINID),
  ]);
}

#[test]
fn test_bootstrap_failure_is_fatal_and_releases_window() {
  let acme = FakeAcme::new(LINE).failing_on(Call::Ctl(CONTROL_WINID, "show".to_string()));
  let plumber = FakePlumber::new(&acme);

  let err = run(&invocation("/"), &acme, &plumber).unwrap_err();

  assert!(
    matches!(err, Error::Bootstrap(BootstrapError::Search(ShowError::Reveal(_)))),
    "got {:?}",
    err
  );
  let calls = acme.calls();
  assert_eq!(calls.last(), Some(&Call::Close(CONTROL_WINID)));
  assert!(!calls.contains(&Call::ReadXdata(CONTROL_WINID)));
  assert!(!calls.contains(&Call::Windows));
}

#[test]
fn test_bogus_addr_read_failure_still_fails() {
  let acme = FakeAcme::new(LINE).failing_on(Call::ReadAddr(CONTROL_WINID));
  let plumber = FakePlumber::new(&acme);

  let err = run(&invocation("/"), &acme, &plumber).unwrap_err();

  assert!(matches!(err, Error::Bootstrap(BootstrapError::ReadAddr(_))), "got {:?}", err);
}

#[test]
fn test_relative_paths_resolve_against_base_dir() {
  let acme = FakeAcme::new("a.txt:3 c ../b.txt:4\n").with_window(2, "/home/glenda/src/a.txt");
  let plumber = FakePlumber::new(&acme);

  let dispatched = run(&invocation("/home/glenda/src"), &acme, &plumber).unwrap();

  assert_eq!(dispatched[0], Dispatch::Retarget(win(2, "/home/glenda/src/a.txt")));
  assert!(acme.calls().contains(&plumbed("/home/glenda/b.txt", "4")));
}

#[test]
fn test_window_names_must_match_exactly() {
  let acme = FakeAcme::new(LINE).with_window(5, "tmp/a.txt").with_window(6, "/TMP/B.TXT");
  let plumber = FakePlumber::new(&acme);

  let dispatched = run(&invocation("/"), &acme, &plumber).unwrap();

  assert_eq!(dispatched, vec![Dispatch::Open, Dispatch::Open]);
}

#[test]
fn test_second_location_is_shown_when_first_fails() {
  let acme = FakeAcme::new(LINE)
    .with_window(5, "/tmp/a.txt")
    .failing_on(Call::Ctl(5, "show".to_string()));
  let plumber = FakePlumber::new(&acme);

  let failures = match run(&invocation("/"), &acme, &plumber) {
    Err(Error::Navigation(failures)) => failures,
    other => panic!("expected navigation failure, got {:?}", other)
  };
  assert_eq!(failures.0.len(), 1);
  let (loc, cause) = &failures.0[0];
  assert_eq!(loc.path, "/tmp/a.txt");
  assert!(matches!(cause, NavigateError::Retarget { source: ShowError::Reveal(_), .. }), "got {:?}", cause);
  assert_eq!(plumber.sent().len(), 1);
  assert_eq!(plumber.sent()[0].data, b"/tmp/b.txt");
  assert!(acme.calls().contains(&Call::Close(5)));
}

#[test]
fn test_each_retarget_step_maps_to_its_error() {
  let cases: [(Call, fn(&ShowError) -> bool); 3] = [
    (Call::WriteAddr(5, "1,2".to_string()), |e| matches!(e, ShowError::AddressSet { addr, .. } if addr == "1,2")),
    (Call::Ctl(5, "dot=addr".to_string()), |e| matches!(e, ShowError::SelectionPromote(_))),
    (Call::Ctl(5, "show".to_string()), |e| matches!(e, ShowError::Reveal(_))),
  ];

  for (fail_on, expected) in cases {
    let acme = FakeAcme::new(LINE).with_window(5, "/tmp/a.txt").failing_on(fail_on.clone());
    let plumber = FakePlumber::new(&acme);

    let Err(Error::Navigation(failures)) = run(&invocation("/"), &acme, &plumber) else {
      panic!("expected navigation failure for {:?}", fail_on);
    };
    match &failures.0[0].1 {
      NavigateError::Retarget { source, .. } => assert!(expected(source), "{:?} gave {:?}", fail_on, source),
      other => panic!("{:?} gave {:?}", fail_on, other)
    }
  }
}

#[test]
fn test_open_view_failure_is_reported() {
  let acme = FakeAcme::new(LINE).with_window(5, "/tmp/a.txt").failing_on(Call::Open(5));
  let plumber = FakePlumber::new(&acme);

  let Err(Error::Navigation(failures)) = run(&invocation("/"), &acme, &plumber) else {
    panic!("expected navigation failure");
  };
  assert!(matches!(&failures.0[0].1, NavigateError::OpenView { id: 5, path, .. } if path == "/tmp/a.txt"));
  assert!(!acme.calls().contains(&plumbed("/tmp/a.txt", "1,2")));
}

#[test]
fn test_both_failures_are_collected() {
  let acme = FakeAcme::new(LINE);
  let plumber = FakePlumber::new(&acme).failing(PlumbFailure::Unavailable);

  let Err(Error::Navigation(failures)) = run(&invocation("/"), &acme, &plumber) else {
    panic!("expected navigation failure");
  };
  assert_eq!(failures.0.len(), 2);
  assert!(failures.0.iter().all(|(_, err)| matches!(err, NavigateError::ChannelUnavailable(_))));
  assert_eq!(failures.0[1].0.path, "/tmp/b.txt");
}

#[test]
fn test_send_failure_names_the_path() {
  let acme = FakeAcme::new(LINE).with_window(5, "/tmp/a.txt");
  let plumber = FakePlumber::new(&acme).failing(PlumbFailure::Send);

  let Err(Error::Navigation(failures)) = run(&invocation("/"), &acme, &plumber) else {
    panic!("expected navigation failure");
  };
  assert_eq!(failures.0.len(), 1);
  assert!(matches!(&failures.0[0].1, NavigateError::SendFailed { path, .. } if path == "/tmp/b.txt"));
}

#[test]
fn test_enumeration_failure_fails_each_location() {
  let acme = FakeAcme::new(LINE).failing_on(Call::Windows);
  let plumber = FakePlumber::new(&acme);

  let Err(Error::Navigation(failures)) = run(&invocation("/"), &acme, &plumber) else {
    panic!("expected navigation failure");
  };
  assert_eq!(failures.0.len(), 2);
  assert!(failures.0.iter().all(|(_, err)| matches!(err, NavigateError::Enumeration(_))));
  assert!(plumber.sent().is_empty());
}

#[test]
fn test_repeated_runs_make_the_same_decisions() {
  let acme = FakeAcme::new(LINE).with_window(5, "/tmp/a.txt");
  let plumber = FakePlumber::new(&acme);
  let invocation = invocation("/");

  let first = run(&invocation, &acme, &plumber).unwrap();
  let second = run(&invocation, &acme, &plumber).unwrap();

  assert_eq!(first, second);
}
