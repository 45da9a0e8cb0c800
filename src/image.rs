//! The parsed model and the Layer API (§4.7 "Layer API / ImageAssembler").
//!
//! `XcfImage` owns the byte buffer for the lifetime of everything parsed out
//! of it, mirroring the teacher's `SaiDocument` owning its `FileSystemReader`
//! (`doc::mod::SaiDocument`): every sub-record here holds an offset or a
//! short-lived borrowed view, never a copy of pixel bytes.

use crate::diagnostics::{Diagnostics, NoopDiagnostics};
use crate::error::{Error, Result};
use crate::format::hierarchy::{channel_count, check_bpp, parse_hierarchy};
use crate::format::layer::{parse_layer, LayerRecord};
use crate::format::parasite::Parasite;
use crate::format::property::{tag, PropertyList, PropertyPayload};
use crate::format::{header::parse_header, header::FileHeader};
use crate::group::{self, GroupInput, GroupNode};
use crate::reader::Reader;
use crate::sink::ImageSink;
use crate::types::{BaseType, BlendMode, Precision};
use crate::validate::{check_magic, parse_version, ParseOptions};

/// One entry in the image's layer vector, in file order (index `0` is
/// GIMP's topmost panel entry).
#[derive(Debug)]
pub struct Layer {
    pub(crate) index: usize,
    pub width: u32,
    pub height: u32,
    pub color_type: u32,
    raw_name: String,
    pub(crate) properties: PropertyList,
    pub(crate) hierarchy_offset: u64,
    pub(crate) mask_offset: u64,
    pub(crate) item_path: Option<Vec<u32>>,
}

impl Layer {
    fn from_record(index: usize, record: LayerRecord) -> Self {
        let item_path = match record.properties.get(tag::ITEM_PATH) {
            Some(PropertyPayload::ItemPath(path)) => Some(path.clone()),
            _ => None,
        };

        Layer {
            index,
            width: record.width,
            height: record.height,
            color_type: record.color_type,
            raw_name: record.name,
            properties: record.properties,
            hierarchy_offset: record.hierarchy_offset,
            mask_offset: record.mask_offset,
            item_path,
        }
    }

    /// The layer's declared name, stripped of GIMP's historical " copy" /
    /// " #N" duplicate-name suffixes (§4.7).
    pub fn name(&self) -> String {
        strip_copy_suffix(&self.raw_name)
    }

    /// The raw, unstripped name as stored in the file.
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn dx(&self) -> i32 {
        match self.properties.get(tag::OFFSETS) {
            Some(PropertyPayload::Offsets { dx, .. }) => *dx,
            _ => 0,
        }
    }

    pub fn dy(&self) -> i32 {
        match self.properties.get(tag::OFFSETS) {
            Some(PropertyPayload::Offsets { dy, .. }) => *dy,
            _ => 0,
        }
    }

    pub fn visible(&self) -> bool {
        match self.properties.get(tag::VISIBLE) {
            Some(PropertyPayload::Bool(v)) => *v,
            // GIMP defaults a layer to visible when the property is absent.
            _ => true,
        }
    }

    pub fn opacity(&self) -> u8 {
        match self.properties.get(tag::OPACITY) {
            Some(PropertyPayload::Opacity(v)) => *v,
            _ => 255,
        }
    }

    pub fn mode(&self) -> BlendMode {
        match self.properties.get(tag::MODE) {
            Some(PropertyPayload::Mode(id)) => BlendMode::resolve(*id),
            _ => BlendMode::Normal,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.properties.get(tag::GROUP_ITEM), Some(PropertyPayload::GroupItem))
    }

    pub fn has_mask(&self) -> bool {
        self.mask_offset != 0
    }

    pub fn has_alpha(&self) -> bool {
        self.color_type % 2 == 1
    }

    pub fn item_path(&self) -> Option<&[u32]> {
        self.item_path.as_deref()
    }

    pub fn property(&self, t: u32) -> Option<&PropertyPayload> {
        self.properties.get(t)
    }

    pub fn parasites(&self, name: &str) -> Option<&Parasite> {
        match self.properties.get(tag::PARASITES) {
            Some(PropertyPayload::Parasites(list)) => list.iter().find(|p| p.name == name),
            _ => None,
        }
    }
}

/// Strips a trailing `" copy"` and/or `" #N"` suffix, GIMP's historical way
/// of disambiguating duplicated layer names.
fn strip_copy_suffix(name: &str) -> String {
    let mut s = name;

    if let Some(hash_pos) = s.rfind(" #") {
        let digits = &s[hash_pos + 2..];
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            s = &s[..hash_pos];
        }
    }

    if let Some(stripped) = s.strip_suffix(" copy") {
        s = stripped;
    }

    s.to_string()
}

/// The fully parsed, immutable model of one `.xcf` file (§3 "Image").
pub struct XcfImage {
    buffer: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub base_type: BaseType,
    pub precision: Precision,
    pub version: u32,
    properties: PropertyList,
    layers: Vec<Layer>,
    group_nodes: Vec<GroupNode>,
    colormap: Option<Vec<[u8; 3]>>,
    detect_cycles: bool,
}

impl XcfImage {
    /// Parses a whole `.xcf` file already read into memory.
    pub fn parse_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::parse_bytes_with_options(bytes, &ParseOptions::default())
    }

    pub fn parse_bytes_with_options(bytes: Vec<u8>, opts: &ParseOptions) -> Result<Self> {
        Self::parse_bytes_with_diagnostics(bytes, opts, &mut NoopDiagnostics)
    }

    /// Like [`XcfImage::parse_bytes_with_options`], but reports soft-failure
    /// conditions (unrecognized property tags, unknown blend-mode ids) to
    /// `diagnostics` instead of discarding them (§7, §9 Open Questions).
    pub fn parse_bytes_with_diagnostics(
        bytes: Vec<u8>,
        opts: &ParseOptions,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<Self> {
        check_magic(&bytes)?;
        let version_token: [u8; 4] = bytes[9..13].try_into().unwrap();
        let version = parse_version(&version_token)?;
        let is_v11 = version >= 11;

        // Every `Reader` below borrows `bytes` only for the duration of one
        // parse call; everything decoded is owned, so `bytes` is free to
        // move into `Self` once parsing is done.
        let header = {
            let mut reader = Reader::new(&bytes);
            reader.seek(14)?;
            parse_header(&mut reader, version, opts, diagnostics)?
        };

        let mut layers = Vec::with_capacity(header.layer_offsets.len());
        for (i, &offset) in header.layer_offsets.iter().enumerate() {
            let reader = Reader::new(&bytes);
            let mut layer_reader = reader.reader_at(offset as usize)?;
            let record = parse_layer(&mut layer_reader, is_v11, opts, diagnostics)?;
            if let Some(PropertyPayload::Mode(id)) = record.properties.get(tag::MODE) {
                if BlendMode::from_raw(*id).is_none() {
                    diagnostics.unknown_blend_mode(*id);
                }
            }
            layers.push(Layer::from_record(i, record));
        }

        let group_inputs: Vec<GroupInput<'_>> = layers
            .iter()
            .map(|l| GroupInput { name: l.raw_name(), item_path: l.item_path() })
            .collect();
        let group_nodes = group::build_group_tree(&group_inputs, opts)?;

        let colormap = match header.properties.get(tag::COLORMAP) {
            Some(PropertyPayload::Colormap(entries)) => Some(entries.clone()),
            _ => None,
        };

        Ok(XcfImage {
            width: header.width,
            height: header.height,
            base_type: header.base_type,
            precision: header.precision,
            version,
            properties: header.properties,
            layers,
            group_nodes,
            colormap,
            detect_cycles: opts.detect_cycles,
            buffer: bytes,
        })
    }

    /// Reads the whole file at `path` into memory and parses it. The only
    /// I/O the core performs; mapped filesystem errors surface as
    /// [`Error::Io`].
    pub fn parse_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::parse_bytes(bytes)
    }

    pub fn is_v11(&self) -> bool {
        self.version >= 11
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn group_tree(&self) -> &[GroupNode] {
        &self.group_nodes
    }

    pub fn colormap(&self) -> Option<&[[u8; 3]]> {
        self.colormap.as_deref()
    }

    pub fn property(&self, t: u32) -> Option<&PropertyPayload> {
        self.properties.get(t)
    }

    /// [SUPPLEMENT] Walks the group tree to decide whether `layer` is
    /// visible once every ancestor group's own visibility is taken into
    /// account, rather than just the layer's own `VISIBLE` property. See
    /// `DESIGN.md` for why `render_composite` uses this instead of
    /// `Layer::visible` directly.
    pub fn effective_visibility(&self, layer: &Layer) -> bool {
        if !layer.visible() {
            return false;
        }
        let Some(path) = layer.item_path() else { return true };

        let mut parent = crate::group::ROOT;
        for &idx in &path[..path.len().saturating_sub(1)] {
            let Some(&node_idx) = self.group_nodes[parent].children.get(idx as usize) else {
                return true;
            };
            if let Some(ancestor_layer_idx) = self.group_nodes[node_idx].layer_index {
                if !self.layers[ancestor_layer_idx].visible() {
                    return false;
                }
            }
            parent = node_idx;
        }
        true
    }

    /// `Layer.group_name` (§4.7): the "/"-joined names of every ancestor the
    /// layer's `ITEM_PATH` walks through.
    pub fn group_name(&self, layer: &Layer) -> String {
        match layer.item_path() {
            Some(path) => group::ancestor_path(&self.group_nodes, path),
            None => String::new(),
        }
    }

    pub fn get_layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    /// Layers whose (suffix-stripped) name matches `pattern` as a regular
    /// expression (§4.7), e.g. `^base$`, `br_.*`, `red|blue`.
    pub fn find_layers_by_pattern(&self, pattern: &str) -> Result<Vec<&Layer>> {
        let re = regex::Regex::new(pattern)
            .map_err(|e| Error::malformed(format!("invalid layer name pattern {pattern:?}: {e}")))?;
        Ok(self.layers.iter().filter(|l| re.is_match(&l.name())).collect())
    }

    pub fn filter_layers<'a>(&'a self, predicate: impl Fn(&Layer) -> bool) -> Vec<&'a Layer> {
        self.layers.iter().filter(|l| predicate(l)).collect()
    }

    pub fn layers_in_group(&self, group_name: &str) -> Vec<&Layer> {
        self.layers.iter().filter(|l| self.group_name(l) == group_name).collect()
    }

    pub fn visible_layers(&self) -> Vec<&Layer> {
        self.layers.iter().filter(|l| self.effective_visibility(l)).collect()
    }

    /// Renders every non-group, effectively-visible layer into `sink`, in
    /// GIMP's panel order reversed (file order is top-to-bottom; painting
    /// proceeds bottom-to-top so later layers composite over earlier ones).
    pub fn render_composite(&self, sink: &mut dyn ImageSink) -> Result<()> {
        for layer in self.layers.iter().rev() {
            if layer.is_group() || !self.effective_visibility(layer) {
                continue;
            }
            self.render_layer(layer, sink, true)?;
        }
        Ok(())
    }

    /// Renders only the named layers, in the order given (first in `names`
    /// is painted first, i.e. ends up at the bottom).
    pub fn render_layers(
        &self,
        sink: &mut dyn ImageSink,
        names: &[&str],
        ignore_visibility: bool,
    ) -> Result<()> {
        for &name in names {
            let Some(layer) = self.get_layer_by_name(name) else {
                return Err(Error::malformed(format!("no layer named {name:?}")));
            };
            if !ignore_visibility && !self.effective_visibility(layer) {
                continue;
            }
            self.render_layer(layer, sink, true)?;
        }
        Ok(())
    }

    /// Renders one layer's pixels into `sink`, delegating to
    /// [`crate::render`]. `use_offset` controls whether the layer's
    /// `(dx, dy)` is applied or tiles are painted at their raw in-layer
    /// coordinates (useful for rendering a single layer at its own origin).
    pub fn render_layer(&self, layer: &Layer, sink: &mut dyn ImageSink, use_offset: bool) -> Result<()> {
        // Group layers carry no pixel payload (§3 "GroupNode"); they are
        // structural only, so rendering one is always a no-op regardless of
        // `use_offset`.
        if layer.is_group() {
            return Ok(());
        }

        let is_v11 = self.is_v11();
        let reader = Reader::new(&self.buffer);
        let mut hreader = reader.reader_at(layer.hierarchy_offset as usize)?;
        let (hierarchy, level) = parse_hierarchy(&mut hreader, is_v11)?;

        check_bpp(hierarchy.bpp, self.base_type, layer.has_alpha(), self.precision)?;

        if self.detect_cycles {
            let chain = std::iter::once(layer.hierarchy_offset)
                .chain(std::iter::once(hierarchy.level_offset))
                .chain(level.tile_offsets.iter().copied());
            crate::validate::check_no_repeated_offsets(chain)?;
        }

        crate::render::render_layer_pixels(self, layer, &level, &hierarchy, sink, use_offset)
    }

    pub(crate) fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub(crate) fn channel_count_for(&self, layer: &Layer) -> u32 {
        channel_count(self.base_type, layer.has_alpha())
    }
}
