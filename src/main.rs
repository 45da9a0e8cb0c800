//! `xcf-cli`: dump a `.xcf` file's layer tree and, when the `png` feature is
//! on, render its composite to a PNG alongside it.
//!
//! Grounded on the teacher's own `main.rs`, which took one input path off
//! argv, parsed it, composited layers into a flat buffer, and wrote a PNG
//! next to it via `PngImage::save`; the composite loop itself now lives in
//! the library (`XcfImage::render_composite`), and the tree dump is new,
//! built with `ptree` over the group tree (§4.7 `group_name`) instead of
//! the teacher's hard-coded single print.

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use xcf::XcfImage;

#[cfg(feature = "tree_view")]
use colored::Colorize;

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("usage: xcf-cli <input.xcf> [output.png]");
        return ExitCode::from(2);
    };
    let output = args.next().map(PathBuf::from);

    match run(Path::new(&input), output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("xcf-cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(input: &Path, output: Option<PathBuf>) -> xcf::Result<()> {
    let image = XcfImage::parse_path(input)?;

    println!(
        "{} {}x{} ({} layer{}, version {})",
        input.display(),
        image.width,
        image.height,
        image.layers().len(),
        if image.layers().len() == 1 { "" } else { "s" },
        image.version
    );

    #[cfg(feature = "tree_view")]
    print_tree(&image);

    #[cfg(feature = "png")]
    render_png(&image, output.unwrap_or_else(|| input.with_extension("png")))?;
    #[cfg(not(feature = "png"))]
    let _ = output;

    Ok(())
}

#[cfg(feature = "png")]
fn render_png(image: &XcfImage, output: PathBuf) -> xcf::Result<()> {
    use xcf::OwnedRaster;

    let mut raster = OwnedRaster::new(image.width, image.height);
    image.render_composite(&mut raster)?;

    let file = std::fs::File::create(&output)?;
    xcf::sink::png_sink::write_to(&raster, file)?;
    println!("wrote {}", output.display());
    Ok(())
}

/// Prints the layer/group tree rooted at [`xcf::XcfImage::group_tree`]'s
/// synthetic root, one `ptree` node per group or layer.
#[cfg(feature = "tree_view")]
fn print_tree(image: &XcfImage) {
    let mut builder = ptree::TreeBuilder::new(format!("{}x{}", image.width, image.height));
    for &child in &image.group_tree()[xcf::group::ROOT].children {
        add_node(image, &mut builder, child);
    }
    let tree = builder.build();
    let _ = ptree::print_tree(&tree);
}

#[cfg(feature = "tree_view")]
fn add_node(image: &XcfImage, builder: &mut ptree::TreeBuilder, node_index: usize) {
    let node = &image.group_tree()[node_index];
    let label = match node.layer_index {
        Some(layer_idx) => node_label(&image.layers()[layer_idx]),
        None => node.name.clone().unwrap_or_else(|| "(empty)".to_string()),
    };

    if node.children.is_empty() {
        builder.add_empty_child(label);
    } else {
        builder.begin_child(label);
        for &child in &node.children {
            add_node(image, builder, child);
        }
        builder.end_child();
    }
}

#[cfg(feature = "tree_view")]
fn node_label(layer: &xcf::image::Layer) -> String {
    let name = layer.name();
    if layer.visible() {
        name.normal().to_string()
    } else {
        format!("{} (hidden)", name.dimmed())
    }
}
