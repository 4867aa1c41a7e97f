//! End-to-end replay runs on the virtual clock.

use approx::assert_relative_eq;
use lockstep_core::{
    ChannelId, Direction, ReplayConfig, ReplaySession, SyncPolicy, SynchronizationSet,
    TransportState,
};
use lockstep_env::{ReplayContext, TokioContext};
use lockstep_sim::{
    load_recording, ChannelLayout, PlaybackDriver, ReplayExport, ScriptId, SimContext,
    SyntheticRecorder,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn fast_config() -> ReplayConfig {
    ReplayConfig {
        frame_interval_ms: 20,
        restart_delay_ms: 100,
        trace_window: 8,
        ..Default::default()
    }
}

/// Writes a recorder file with `rows` data rows. Column `c` of row `r` holds
/// `10 * r + (c - 2)`.
fn write_recording(dir: &Path, name: &str, rows: usize) -> PathBuf {
    let mut text = String::from("Frame\tTime\tmarkers\n");
    for r in 0..rows {
        let mut fields = vec![r.to_string(), format!("{:.3}", r as f64 * 0.01)];
        fields.extend((0..30).map(|i| (10 * r + i).to_string()));
        text.push_str(&fields.join("\t"));
        text.push('\n');
    }
    text.push('\n');
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn synthetic_session(lengths: &[usize], config: &ReplayConfig) -> ReplaySession {
    let streams = SyntheticRecorder::new(42).record_session(lengths).unwrap();
    let set = SynchronizationSet::build(streams, config.warp_enabled).unwrap();
    ReplaySession::new(set, config)
}

#[tokio::test]
async fn test_warped_recordings_end_together_and_restart() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ChannelLayout::default();
    let short = load_recording(write_recording(dir.path(), "a.tsv", 100), &layout).unwrap();
    let long = load_recording(write_recording(dir.path(), "b.tsv", 137), &layout).unwrap();

    let config = fast_config();
    let set = SynchronizationSet::build(vec![short, long], true).unwrap();
    assert_eq!(set.common_length(), 137);
    assert_eq!(set.policy(), SyncPolicy::Warp);

    // Endpoints of the stretched stream are the recorded endpoints
    let tip = ChannelId::from(ChannelId::INSTRUMENT_TIP);
    let warped = set.get(0).unwrap().channel(&tip).unwrap();
    assert_eq!(warped.len(), 137);
    assert_relative_eq!(warped[0].x, 15.0);
    assert_relative_eq!(warped[136].x, 1005.0);

    let ctx = SimContext::shared();
    let mut driver = PlaybackDriver::new(ctx.clone(), ReplaySession::new(set, &config));

    let summary = driver.run(137).await;
    assert_eq!(summary.ends, 1);
    assert_eq!(summary.final_state, TransportState::Ended);
    assert_eq!(summary.final_global_index, Some(137));
    assert_eq!(summary.final_indices, vec![137, 137]);

    // Held during the settle delay, reset on the fifth step
    let summary = driver.run(4).await;
    assert_eq!(summary.final_state, TransportState::Ended);
    let summary = driver.run(1).await;
    assert_eq!(summary.restarts, 1);
    assert_eq!(summary.final_state, TransportState::Playing(Direction::Forward));
    assert_eq!(summary.final_indices, vec![0, 0]);
    assert_eq!(ctx.now(), Duration::from_millis(142 * 20));
}

#[tokio::test]
async fn test_independent_streams_end_with_the_longest() {
    let config = ReplayConfig {
        warp_enabled: false,
        ..fast_config()
    };
    let mut driver = PlaybackDriver::new(SimContext::shared(), synthetic_session(&[30, 50], &config));

    let summary = driver.run(30).await;
    assert_eq!(summary.final_global_index, None);
    assert_eq!(summary.final_indices, vec![30, 30]);
    assert_eq!(summary.ends, 0);

    let playback = driver.session().playback();
    assert!(playback.cursor(0).unwrap().is_exhausted());
    assert!(!playback.cursor(1).unwrap().is_exhausted());

    let summary = driver.run(20).await;
    assert_eq!(summary.ends, 1);
    assert_eq!(summary.final_indices, vec![30, 50]);
}

#[tokio::test]
async fn test_restart_script_resets_midway() {
    let config = fast_config();
    let script = ScriptId::Restart.script(config.speed_step);
    let mut driver = PlaybackDriver::new(SimContext::shared(), synthetic_session(&[1000], &config))
        .with_script(script);

    // Requested at step 150; playback continues through the settle delay
    let summary = driver.run(153).await;
    assert_eq!(summary.restarts, 0);
    assert_eq!(summary.final_global_index, Some(153));

    let summary = driver.run(1).await;
    assert_eq!(summary.restarts, 1);
    assert_eq!(summary.ends, 0);
    assert_eq!(summary.final_global_index, Some(0));
}

#[tokio::test]
async fn test_pause_resume_script() {
    let config = fast_config();
    let script = ScriptId::PauseResume.script(config.speed_step);
    let mut driver = PlaybackDriver::new(SimContext::shared(), synthetic_session(&[1000], &config))
        .with_script(script);

    driver.run(199).await;
    assert_eq!(driver.session().state(), TransportState::Paused);
    assert_eq!(driver.session().playback().global_index(), Some(99));

    // Resumes in the direction chosen while paused
    driver.run(60).await;
    assert_eq!(
        driver.session().state(),
        TransportState::Playing(Direction::Rewind)
    );
    assert_eq!(driver.session().playback().global_index(), Some(39));
}

#[tokio::test]
async fn test_export_written_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("replay.json");

    let mut driver = PlaybackDriver::new(SimContext::shared(), synthetic_session(&[20, 25], &fast_config()))
        .with_export();
    driver.run(25).await;

    let export = driver.take_export().unwrap();
    export.write_to_file(path.to_str().unwrap()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let loaded: ReplayExport = serde_json::from_str(&text).unwrap();
    assert_eq!(loaded.frames.len(), 25);
    assert_eq!(loaded.common_length, 25);
    assert_eq!(loaded.frames.last().unwrap().state, TransportState::Ended);

    let summary = loaded.summary.unwrap();
    assert_eq!(summary.ticks, 25);
    assert_eq!(summary.ends, 1);

    // Scene units are meters
    let first = &loaded.frames[0].streams[0];
    let head = first.head_center.unwrap();
    assert!(head[1] > 0.05 && head[1] < 0.15);
}

#[tokio::test]
async fn test_realtime_context_drives_the_same_session() {
    let config = ReplayConfig {
        frame_interval_ms: 1,
        ..fast_config()
    };
    let mut driver = PlaybackDriver::new(TokioContext::shared(), synthetic_session(&[10], &config))
        .with_step(Duration::from_millis(1));

    let summary = driver.run(3).await;
    assert_eq!(summary.ticks, 3);
    assert!(summary.elapsed_secs >= 0.003);
}
