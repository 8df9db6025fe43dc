use viewfactor::{
    Bvh, SelfIntersection, Triangulation, VisibilityConfig, compute_visibility,
    geometry::{WorldPoint, WorldVector},
};

use indicatif::ProgressBar;

fn main() -> anyhow::Result<()> {
    // Two parallel plates one unit apart, partially shaded by a tilted panel in between.
    let emitter = Triangulation::rectangle(
        WorldPoint::new(0.0, 0.0, 0.0),
        WorldVector::new(1.0, 0.0, 0.0),
        WorldVector::new(0.0, 1.0, 0.0),
        40,
        40,
    )?;
    let receiver = Triangulation::rectangle(
        WorldPoint::new(0.0, 0.0, 1.0),
        WorldVector::new(0.0, 1.0, 0.0),
        WorldVector::new(1.0, 0.0, 0.0),
        40,
        40,
    )?;
    let blocker = Triangulation::cuboid(
        WorldPoint::new(0.2, 0.3, 0.45),
        WorldPoint::new(0.6, 0.7, 0.55),
        0.02,
    )?;

    let config = VisibilityConfig::builder()
        .self_intersection(SelfIntersection::Both)
        .build();

    let blocker_bvh = Bvh::build(&blocker, &config.bvh)?;
    println!("Blocker BVH:\n{}", blocker_bvh.statistics());

    let bar = ProgressBar::new(emitter.len() as u64);
    let visibility = compute_visibility(&emitter, &receiver, Some(&blocker), &config, {
        let bar = bar.clone();
        move |progress| {
            bar.update(|ps| {
                ps.set_len(progress.total as u64);
                ps.set_pos(progress.finished as u64)
            })
        }
    })?;
    bar.finish();

    println!(
        "{} pairs: {} visible, {} blocked, {} culled",
        visibility.pair_count(),
        visibility.visible,
        visibility.blocked,
        visibility.culled
    );

    Ok(())
}
