//! End-to-end scenarios driven through the public engine surface: commands
//! in, configure requests out, acks back, committed state checked.

use std::time::Instant;

use colonnade::geometry::Point;
use colonnade::surface::SurfaceRequest;
use colonnade::tree::WindowParent;
use colonnade::{Engine, FullscreenMode, NodeId, Rectangle, SurfaceId};

fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn engine_with_output() -> (Engine, NodeId) {
    init_logs();
    let mut engine = Engine::new(colonnade_config::Config::default());
    let output = engine.add_output("DP-1", Rectangle::from_coords(0, 0, 1000, 1000));
    engine.enable_output(output);
    (engine, output)
}

fn map(engine: &mut Engine) -> NodeId {
    let win = engine.map_window_with_parent_lookup(SurfaceId::unique(), None, Instant::now(), |_| {
        None
    });
    settle(engine);
    win
}

/// Commit and play the part of well-behaved clients: ack every configure
/// until the engine goes quiet.
fn settle(engine: &mut Engine) {
    let now = Instant::now();
    engine.commit(now);
    loop {
        let mut acked = false;
        for request in engine.take_requests() {
            if let SurfaceRequest::Configure {
                surface, serial, ..
            } = request
            {
                engine.ack_configure(surface, serial, now);
                acked = true;
            }
        }
        if !acked {
            break;
        }
    }
}

fn run(engine: &mut Engine, argv: &[&str]) -> colonnade::CmdResult {
    let result = engine.command(argv, Instant::now());
    settle(engine);
    result
}

/// The §3.2 invariants, checked after every interesting step.
fn check_invariants(engine: &Engine) {
    let tree = &engine.tree;

    // No window appears in two parents' child lists.
    let mut seen = std::collections::HashSet::new();
    for ws in tree.all_workspaces() {
        for &win in &ws.floating {
            assert!(seen.insert(win), "window in two parents");
            assert_eq!(tree.window(win).parent, WindowParent::Workspace(ws.id()));
        }
    }
    for column in tree.all_columns() {
        assert!(
            tree.try_workspace(column.workspace).is_some(),
            "column back-reference dangling"
        );
        for &win in &column.children {
            assert!(seen.insert(win), "window in two parents");
            assert_eq!(tree.window(win).parent, WindowParent::Column(column.id()));
        }
        if let Some(active) = column.active_child {
            assert!(column.children.contains(&active), "stale active_child");
        }
    }

    // Fullscreen pointers.
    let mut global_count = 0;
    for ws in tree.all_workspaces() {
        if let Some(fs) = ws.fullscreen {
            assert_eq!(
                tree.window(fs).pending.fullscreen_mode,
                FullscreenMode::Workspace
            );
            assert_eq!(tree.window_workspace(fs), ws.id());
        }
    }
    for window in tree.all_windows() {
        if window.pending.fullscreen_mode == FullscreenMode::Global {
            global_count += 1;
        }
        // Sticky windows float on their output's active workspace.
        if window.is_sticky_effective() {
            let ws = tree.window_workspace(window.id());
            let output = tree.workspace(ws).output.expect("sticky on live output");
            if tree.output(output).enabled {
                assert_eq!(tree.output(output).active_workspace, Some(ws));
            }
        }
    }
    assert!(global_count <= 1, "more than one global fullscreen");

    // Unique names; enabled outputs never workspace-less.
    let mut names = std::collections::HashSet::new();
    for ws in tree.all_workspaces() {
        assert!(names.insert(ws.name.clone()), "duplicate workspace name");
    }
    for output in tree.enabled_outputs() {
        assert!(!output.workspaces.is_empty(), "enabled output without workspace");
    }

    // Width fractions normalized after arrangement.
    for ws in tree.all_workspaces() {
        if ws.columns.len() > 1 {
            let total: f64 = ws
                .columns
                .iter()
                .map(|&col| tree.column(col).width_fraction)
                .sum();
            assert!((total - 1.0).abs() < 1e-6, "fractions not normalized: {total}");
        }
    }

    // Id lookup agrees with itself.
    for window in tree.all_windows() {
        assert_eq!(
            tree.find_window_by_id(window.id().get()).map(|w| w.id()),
            Some(window.id())
        );
    }
}

// {{{ Scenarios

#[test]
fn s1_column_reflow_on_drag() {
    let (mut engine, _) = engine_with_output();
    let w1 = map(&mut engine);
    let w2 = map(&mut engine);
    // Stack w2 under w1 so one column holds [w1, w2].
    run(&mut engine, &["move", "left"]);
    run(&mut engine, &["focus", "up"]);
    assert_eq!(engine.focused_window(), Some(w1));

    let col = engine.tree.window_column(w1).unwrap();
    assert_eq!(engine.tree.column(col).children, vec![w1, w2]);

    engine.begin_move_grab(w1, Point::new(500.0, 100.0));
    let now = Instant::now();
    engine.pointer_motion(Point::new(995.0, 800.0), now);
    engine.pointer_motion(Point::new(995.0, 800.0), now);
    engine.end_pointer_ops(now);
    settle(&mut engine);

    let ws = engine.focused_workspace().unwrap();
    let columns = engine.tree.workspace(ws).columns.clone();
    assert_eq!(columns.len(), 2);
    assert_eq!(engine.tree.column(columns[0]).children, vec![w2]);
    assert_eq!(engine.tree.column(columns[1]).children, vec![w1]);
    assert_eq!(engine.focused_window(), Some(w1));
    for &col in &columns {
        let fraction = engine.tree.column(col).width_fraction;
        assert!((fraction - 0.5).abs() < 1e-6);
    }
    check_invariants(&engine);
}

#[test]
fn s2_smart_gap_collapse() {
    let mut config = colonnade_config::Config::default();
    config.general.smart_gaps = colonnade_config::SmartGaps::On;
    config.general.gaps_inner = 10;
    config.general.gaps_outer.top = 20;
    config.decorations.border_style = colonnade_config::BorderStyle::None;

    let mut engine = Engine::new(config);
    let output = engine.add_output("DP-1", Rectangle::from_coords(0, 0, 1000, 1000));
    engine.enable_output(output);

    let w1 = map(&mut engine);
    // Lone window: every gap collapses.
    assert_eq!(
        engine.tree.window(w1).current.rect,
        Rectangle::from_coords(0, 0, 1000, 1000)
    );

    let w2 = map(&mut engine);
    let r1 = engine.tree.window(w1).current.rect;
    let r2 = engine.tree.window(w2).current.rect;
    // Gaps return: outer top 20 + inner 10 at the edges, inner 10 between
    // the two columns.
    assert_eq!(r1.loc, Point::new(10, 30));
    assert_eq!(r1.size.h, 1000 - 30 - 10);
    assert!(r2.loc.x >= r1.loc.x + r1.size.w + 10);
    assert_eq!(r2.loc.x + r2.size.w, 990);
    check_invariants(&engine);
}

#[test]
fn s3_fullscreen_takeover() {
    let (mut engine, _) = engine_with_output();
    let w1 = map(&mut engine);
    let w2 = map(&mut engine);

    run(&mut engine, &["focus", "left"]);
    assert!(run(&mut engine, &["fullscreen", "enable"]).is_success());
    let ws = engine.focused_workspace().unwrap();
    assert_eq!(engine.tree.workspace(ws).fullscreen, Some(w1));

    run(&mut engine, &["focus", "right"]);
    assert!(run(&mut engine, &["fullscreen", "enable"]).is_success());
    assert_eq!(engine.tree.workspace(ws).fullscreen, Some(w2));
    assert_eq!(
        engine.tree.window(w1).pending.fullscreen_mode,
        FullscreenMode::None
    );
    check_invariants(&engine);
}

#[test]
fn s4_sticky_follows_workspace_switch() {
    let (mut engine, output) = engine_with_output();
    let w1 = map(&mut engine);
    run(&mut engine, &["floating", "enable"]);
    run(&mut engine, &["sticky", "enable"]);

    let before = engine.tree.window(w1).pending.rect;
    run(&mut engine, &["workspace", "B"]);

    let ws_b = engine.tree.workspace_by_name("B").unwrap().id();
    assert_eq!(engine.tree.output(output).active_workspace, Some(ws_b));
    assert_eq!(engine.tree.window_workspace(w1), ws_b);
    assert_eq!(engine.tree.window(w1).pending.rect, before);
    check_invariants(&engine);
}

#[test]
fn s5_output_evacuation() {
    let mut engine = Engine::new(colonnade_config::Config::default());
    let o1 = engine.add_output("DP-1", Rectangle::from_coords(0, 0, 1000, 1000));
    let o2 = engine.add_output("DP-2", Rectangle::from_coords(1000, 0, 1000, 1000));
    engine.enable_output(o1);
    engine.enable_output(o2);

    // O1 carries workspaces a and b (with a window each); O2 carries c.
    run(&mut engine, &["workspace", "a"]);
    let wa = map(&mut engine);
    run(&mut engine, &["workspace", "b"]);
    let wb = map(&mut engine);
    run(&mut engine, &["focus", "output", "right"]);
    run(&mut engine, &["workspace", "c"]);

    let ws_a = engine.tree.workspace_by_name("a").unwrap().id();
    let ws_b = engine.tree.workspace_by_name("b").unwrap().id();
    assert_eq!(engine.tree.workspace(ws_a).output, Some(o1));

    engine.take_events();
    engine.disable_output(o1);
    settle(&mut engine);

    assert_eq!(engine.tree.workspace(ws_a).output, Some(o2));
    assert_eq!(engine.tree.workspace(ws_b).output, Some(o2));
    let names: Vec<String> = engine
        .tree
        .output(o2)
        .workspaces
        .iter()
        .map(|&ws| engine.tree.workspace(ws).name.clone())
        .collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    // Windows survived.
    assert!(engine.tree.try_window(wa).is_some());
    assert!(engine.tree.try_window(wb).is_some());

    let events = engine.take_events();
    let moved: Vec<_> = events
        .iter()
        .filter(|event| {
            matches!(
                event,
                colonnade::Event::Workspace {
                    change: colonnade_ipc::WorkspaceChange::Move,
                    ..
                }
            )
        })
        .collect();
    assert_eq!(moved.len(), 2);
    check_invariants(&engine);
}

#[test]
fn s6_swap_across_workspaces() {
    let (mut engine, _) = engine_with_output();
    run(&mut engine, &["workspace", "A"]);
    let w1 = map(&mut engine);
    run(&mut engine, &["workspace", "B"]);
    let w2 = map(&mut engine);
    run(&mut engine, &["workspace", "A"]);
    assert_eq!(engine.focused_window(), Some(w1));

    let f1 = engine.tree.window(w1).height_fraction;
    let f2 = engine.tree.window(w2).height_fraction;

    let id = w2.get().to_string();
    assert!(run(
        &mut engine,
        &["swap", "container", "with", "container_id", id.as_str()]
    )
    .is_success());

    let ws_a = engine.tree.workspace_by_name("A").unwrap().id();
    let ws_b = engine.tree.workspace_by_name("B").unwrap().id();
    assert_eq!(engine.tree.window_workspace(w2), ws_a);
    assert_eq!(engine.tree.window_workspace(w1), ws_b);
    // Focus followed w1 to workspace B.
    assert_eq!(engine.focused_window(), Some(w1));
    assert_eq!(engine.focused_workspace(), Some(ws_b));
    assert_eq!(engine.tree.window(w1).height_fraction, f2);
    assert_eq!(engine.tree.window(w2).height_fraction, f1);
    check_invariants(&engine);
}

// }}}

// {{{ Laws

#[test]
fn l1_workspace_move_round_trip() {
    let (mut engine, _) = engine_with_output();
    run(&mut engine, &["workspace", "X"]);
    let win = map(&mut engine);
    let ws_x = engine.tree.workspace_by_name("X").unwrap().id();

    run(&mut engine, &["move", "to", "workspace", "Y"]);
    assert_ne!(engine.tree.window_workspace(win), ws_x);
    let win_id = win.get().to_string();
    run(&mut engine, &["focus", "id", win_id.as_str()]);
    run(&mut engine, &["move", "to", "workspace", "X"]);
    assert_eq!(engine.tree.window_workspace(win), ws_x);
    check_invariants(&engine);
}

#[test]
fn l2_floating_round_trip() {
    let (mut engine, _) = engine_with_output();
    let win = map(&mut engine);
    let ws = engine.tree.window_workspace(win);

    run(&mut engine, &["floating", "on"]);
    assert!(engine.tree.window(win).is_floating());
    run(&mut engine, &["floating", "off"]);
    assert!(!engine.tree.window(win).is_floating());
    assert_eq!(engine.tree.window_workspace(win), ws);
    check_invariants(&engine);
}

#[test]
fn l3_fullscreen_round_trip_restores_geometry() {
    let (mut engine, _) = engine_with_output();
    let _other = map(&mut engine);
    let win = map(&mut engine);
    let before = engine.tree.window(win).current.rect;

    run(&mut engine, &["fullscreen", "enable"]);
    assert_ne!(engine.tree.window(win).current.rect, before);
    run(&mut engine, &["fullscreen", "disable"]);
    assert_eq!(engine.tree.window(win).current.rect, before);
    check_invariants(&engine);
}

#[test]
fn l4_mark_unmark_round_trip() {
    let (mut engine, _) = engine_with_output();
    let win = map(&mut engine);
    let before = engine.tree.window(win).marks.clone();

    run(&mut engine, &["mark", "--add", "scratch"]);
    assert!(engine.tree.window(win).has_mark("scratch"));
    run(&mut engine, &["unmark", "scratch"]);
    assert_eq!(engine.tree.window(win).marks, before);
    check_invariants(&engine);
}

#[test]
fn l5_swap_twice_is_identity() {
    let (mut engine, _) = engine_with_output();
    let w1 = map(&mut engine);
    let w2 = map(&mut engine);
    run(&mut engine, &["focus", "left"]);

    let col = engine.tree.window_column(w1).unwrap();
    let before = engine.tree.column(col).children.clone();

    let id = w2.get().to_string();
    run(&mut engine, &["swap", "container", "with", "container_id", id.as_str()]);
    run(&mut engine, &["swap", "container", "with", "container_id", id.as_str()]);

    assert_eq!(engine.tree.column(col).children, before);
    assert_eq!(engine.focused_window(), Some(w1));
    check_invariants(&engine);
}

// }}}

// {{{ Boundary behaviors

#[test]
fn duplicate_workspace_name_reuses_existing() {
    let (mut engine, _) = engine_with_output();
    run(&mut engine, &["workspace", "mail"]);
    let first = engine.tree.workspace_by_name("mail").unwrap().id();
    run(&mut engine, &["workspace", "2"]);
    run(&mut engine, &["workspace", "mail"]);
    assert_eq!(engine.tree.workspace_by_name("mail").unwrap().id(), first);
    assert_eq!(
        engine
            .tree
            .all_workspaces()
            .filter(|ws| ws.name == "mail")
            .count(),
        1
    );
}

#[test]
fn resize_below_min_sane_is_a_noop_success() {
    let (mut engine, _) = engine_with_output();
    let w1 = map(&mut engine);
    let _w2 = map(&mut engine);
    // Stack both in one column so a vertical resize has a neighbor.
    run(&mut engine, &["move", "left"]);
    run(&mut engine, &["focus", "up"]);

    let before = engine.tree.window(w1).current.rect;
    // Shrinking by 950px would leave the window far below MIN_SANE_H.
    let result = run(&mut engine, &["resize", "shrink", "height", "950", "px"]);
    assert!(result.is_success());
    assert_eq!(engine.tree.window(w1).current.rect, before);
}

#[test]
fn moving_lone_window_left_stays_put() {
    let (mut engine, _) = engine_with_output();
    let win = map(&mut engine);
    let col = engine.tree.window_column(win).unwrap();

    let result = engine.command(&["move", "left"], Instant::now());
    assert!(matches!(result, colonnade::CmdResult::Failure(_)));
    assert_eq!(engine.tree.window_column(win), Some(col));
    check_invariants(&engine);
}

#[test]
fn sticky_window_survives_output_removal() {
    let mut engine = Engine::new(colonnade_config::Config::default());
    let o1 = engine.add_output("DP-1", Rectangle::from_coords(0, 0, 1000, 1000));
    let o2 = engine.add_output("DP-2", Rectangle::from_coords(1000, 0, 1000, 1000));
    engine.enable_output(o1);
    engine.enable_output(o2);

    let win = map(&mut engine);
    run(&mut engine, &["floating", "enable"]);
    run(&mut engine, &["sticky", "enable"]);
    assert_eq!(
        engine
            .tree
            .workspace(engine.tree.window_workspace(win))
            .output,
        Some(o1)
    );

    engine.disable_output(o1);
    settle(&mut engine);

    let ws = engine.tree.window_workspace(win);
    assert_eq!(engine.tree.workspace(ws).output, Some(o2));
    assert_eq!(engine.tree.output(o2).active_workspace, Some(ws));
    assert!(engine.tree.window(win).is_sticky);
    check_invariants(&engine);
}

#[test]
fn hit_testing_is_deterministic_between_commits() {
    let (mut engine, _) = engine_with_output();
    let _w1 = map(&mut engine);
    let _w2 = map(&mut engine);

    let first = engine.target_at(Point::new(432.0, 617.0));
    let second = engine.target_at(Point::new(432.0, 617.0));
    assert_eq!(first, second);
}

// }}}
