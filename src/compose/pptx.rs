//! PresentationML (`.pptx`) writer for image-only decks.
//!
//! Writes the smallest package PowerPoint and LibreOffice accept: one slide
//! master, one blank layout, one theme, and per page a slide part holding a
//! single full-bleed picture plus its media part.
//!
//! Part and relationship layout:
//!
//! ```text
//! ppt/presentation.xml   rId1 → master, rId2 → theme, rId3.. → slides
//! ppt/slides/slideN.xml  rId1 → layout, rId2 → ../media/imageN.ext
//! ```

use super::{SlideDeck, SlideWriter};
use crate::error::ConvertError;
use crate::pipeline::geometry::TargetGeometry;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// First slide id PowerPoint accepts.
const FIRST_SLIDE_ID: usize = 256;

/// Writes `.pptx` decks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PptxWriter;

impl SlideWriter for PptxWriter {
    fn begin(&self, geometry: &TargetGeometry) -> Box<dyn SlideDeck> {
        Box::new(PptxDeck {
            geometry: *geometry,
            slides: Vec::new(),
        })
    }
}

struct SlideMedia {
    page_index: usize,
    bytes: Vec<u8>,
    ext: &'static str,
}

/// Deck under construction; slide images are held in memory until save.
struct PptxDeck {
    geometry: TargetGeometry,
    slides: Vec<SlideMedia>,
}

impl SlideDeck for PptxDeck {
    fn add_slide(&mut self, page_index: usize, image: &Path) -> Result<(), ConvertError> {
        let failed = |detail: String| ConvertError::CompositionFailed {
            page: Some(page_index + 1),
            detail,
        };
        let bytes = std::fs::read(image)
            .map_err(|e| failed(format!("cannot read {}: {}", image.display(), e)))?;
        let ext = match image::guess_format(&bytes) {
            Ok(image::ImageFormat::Png) => "png",
            Ok(image::ImageFormat::Jpeg) => "jpeg",
            Ok(other) => return Err(failed(format!("unsupported slide image format {other:?}"))),
            Err(e) => return Err(failed(e.to_string())),
        };
        self.slides.push(SlideMedia {
            page_index,
            bytes,
            ext,
        });
        Ok(())
    }

    fn save(self: Box<Self>, path: &Path) -> Result<(), ConvertError> {
        let failed = |detail: String| ConvertError::CompositionFailed { page: None, detail };
        let file = File::create(path).map_err(|e| failed(e.to_string()))?;
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        for (name, body) in self.parts() {
            zip.start_file(name.as_str(), options)
                .map_err(|e| failed(format!("{name}: {e}")))?;
            zip.write_all(&body)
                .map_err(|e| failed(format!("{name}: {e}")))?;
        }

        zip.finish()
            .map_err(|e| failed(e.to_string()))?
            .flush()
            .map_err(|e| failed(e.to_string()))?;
        debug!("Saved deck with {} slides to {}", self.slides.len(), path.display());
        Ok(())
    }
}

impl PptxDeck {
    /// Every package part as (zip entry name, body), in write order.
    fn parts(&self) -> Vec<(String, Vec<u8>)> {
        let mut parts = vec![
            ("[Content_Types].xml".to_string(), self.content_types().into_bytes()),
            ("_rels/.rels".to_string(), package_rels().into_bytes()),
            ("ppt/presentation.xml".to_string(), self.presentation().into_bytes()),
            (
                "ppt/_rels/presentation.xml.rels".to_string(),
                self.presentation_rels().into_bytes(),
            ),
            (
                "ppt/slideMasters/slideMaster1.xml".to_string(),
                slide_master().into_bytes(),
            ),
            (
                "ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(),
                relationships(&[
                    ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
                    ("rId2", "theme", "../theme/theme1.xml"),
                ])
                .into_bytes(),
            ),
            (
                "ppt/slideLayouts/slideLayout1.xml".to_string(),
                slide_layout().into_bytes(),
            ),
            (
                "ppt/slideLayouts/_rels/slideLayout1.xml.rels".to_string(),
                relationships(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")])
                    .into_bytes(),
            ),
            ("ppt/theme/theme1.xml".to_string(), theme().into_bytes()),
        ];

        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            let media = format!("image{n}.{}", slide.ext);
            parts.push((
                format!("ppt/slides/slide{n}.xml"),
                self.slide(n, slide.page_index).into_bytes(),
            ));
            parts.push((
                format!("ppt/slides/_rels/slide{n}.xml.rels"),
                relationships(&[
                    ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
                    ("rId2", "image", &format!("../media/{media}")),
                ])
                .into_bytes(),
            ));
            parts.push((format!("ppt/media/{media}"), slide.bytes.clone()));
        }
        parts
    }

    fn content_types(&self) -> String {
        let ct = "application/vnd.openxmlformats-officedocument";
        let mut xml = String::with_capacity(2048);
        xml.push_str(XML_DECL);
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
        xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
        xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
        xml.push_str(r#"<Default Extension="png" ContentType="image/png"/>"#);
        xml.push_str(r#"<Default Extension="jpeg" ContentType="image/jpeg"/>"#);
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/presentation.xml" ContentType="{ct}.presentationml.presentation.main+xml"/>"#
        ));
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="{ct}.presentationml.slideMaster+xml"/>"#
        ));
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="{ct}.presentationml.slideLayout+xml"/>"#
        ));
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="{ct}.theme+xml"/>"#
        ));
        for n in 1..=self.slides.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="{ct}.presentationml.slide+xml"/>"#
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn presentation(&self) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_DECL);
        xml.push_str(&format!(
            r#"<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}">"#
        ));
        xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
        if !self.slides.is_empty() {
            xml.push_str("<p:sldIdLst>");
            for i in 0..self.slides.len() {
                xml.push_str(&format!(
                    r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                    FIRST_SLIDE_ID + i,
                    i + 3
                ));
            }
            xml.push_str("</p:sldIdLst>");
        }
        xml.push_str(&format!(
            r#"<p:sldSz cx="{}" cy="{}"/>"#,
            self.geometry.width_emu, self.geometry.height_emu
        ));
        xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
        xml.push_str("</p:presentation>");
        xml
    }

    fn presentation_rels(&self) -> String {
        let slide_targets: Vec<(String, String)> = (1..=self.slides.len())
            .map(|n| (format!("rId{}", n + 2), format!("slides/slide{n}.xml")))
            .collect();
        let mut rels = vec![
            ("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
            ("rId2", "theme", "theme/theme1.xml"),
        ];
        rels.extend(
            slide_targets
                .iter()
                .map(|(id, target)| (id.as_str(), "slide", target.as_str())),
        );
        relationships(&rels)
    }

    fn slide(&self, n: usize, page_index: usize) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_DECL);
        xml.push_str(&format!(r#"<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}">"#));
        xml.push_str("<p:cSld><p:spTree>");
        xml.push_str(GROUP_SHAPE_PROPS);
        xml.push_str("<p:pic><p:nvPicPr>");
        xml.push_str(&format!(
            r#"<p:cNvPr id="2" name="Picture {n}" descr="Page {}"/>"#,
            page_index + 1
        ));
        xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/>"#);
        xml.push_str("</p:nvPicPr>");
        xml.push_str(r#"<p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#);
        xml.push_str(&format!(
            r#"<p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#,
            self.geometry.width_emu, self.geometry.height_emu
        ));
        xml.push_str("</p:pic>");
        xml.push_str("</p:spTree></p:cSld>");
        xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
        xml.push_str("</p:sld>");
        xml
    }
}

/// Empty group-shape header every shape tree starts with.
const GROUP_SHAPE_PROPS: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

fn relationships(rels: &[(&str, &str, &str)]) -> String {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(XML_DECL);
    xml.push_str(&format!(r#"<Relationships xmlns="{NS_PKG_RELS}">"#));
    for (id, kind, target) in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{id}" Type="{REL_BASE}/{kind}" Target="{target}"/>"#
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn package_rels() -> String {
    relationships(&[("rId1", "officeDocument", "ppt/presentation.xml")])
}

fn slide_master() -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    xml.push_str(&format!(r#"<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}">"#));
    xml.push_str("<p:cSld><p:spTree>");
    xml.push_str(GROUP_SHAPE_PROPS);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(concat!(
        r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
        r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#
    ));
    xml.push_str(r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#);
    xml.push_str("</p:sldMaster>");
    xml
}

fn slide_layout() -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    xml.push_str(&format!(
        r#"<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" type="blank" preserve="1">"#
    ));
    xml.push_str(r#"<p:cSld name="Blank"><p:spTree>"#);
    xml.push_str(GROUP_SHAPE_PROPS);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sldLayout>");
    xml
}

fn theme() -> String {
    let colors = [
        ("dk1", r#"<a:sysClr val="windowText" lastClr="000000"/>"#.to_string()),
        ("lt1", r#"<a:sysClr val="window" lastClr="FFFFFF"/>"#.to_string()),
        ("dk2", srgb("1F497D")),
        ("lt2", srgb("EEECE1")),
        ("accent1", srgb("4F81BD")),
        ("accent2", srgb("C0504D")),
        ("accent3", srgb("9BBB59")),
        ("accent4", srgb("8064A2")),
        ("accent5", srgb("4BACC6")),
        ("accent6", srgb("F79646")),
        ("hlink", srgb("0000FF")),
        ("folHlink", srgb("800080")),
    ];
    let fonts = r#"<a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/>"#;
    let fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;

    let mut xml = String::with_capacity(3072);
    xml.push_str(XML_DECL);
    xml.push_str(&format!(r#"<a:theme xmlns:a="{NS_A}" name="Office Theme"><a:themeElements>"#));
    xml.push_str(r#"<a:clrScheme name="Office">"#);
    for (slot, color) in &colors {
        xml.push_str(&format!("<a:{slot}>{color}</a:{slot}>"));
    }
    xml.push_str("</a:clrScheme>");
    xml.push_str(&format!(
        r#"<a:fontScheme name="Office"><a:majorFont>{fonts}</a:majorFont><a:minorFont>{fonts}</a:minorFont></a:fontScheme>"#
    ));
    xml.push_str(r#"<a:fmtScheme name="Office">"#);
    xml.push_str(&format!("<a:fillStyleLst>{}</a:fillStyleLst>", fill.repeat(3)));
    xml.push_str(&format!(
        "<a:lnStyleLst>{}</a:lnStyleLst>",
        format!(r#"<a:ln w="9525">{fill}</a:ln>"#).repeat(3)
    ));
    xml.push_str(&format!(
        "<a:effectStyleLst>{}</a:effectStyleLst>",
        "<a:effectStyle><a:effectLst/></a:effectStyle>".repeat(3)
    ));
    xml.push_str(&format!("<a:bgFillStyleLst>{}</a:bgFillStyleLst>", fill.repeat(3)));
    xml.push_str("</a:fmtScheme>");
    xml.push_str("</a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>");
    xml
}

fn srgb(hex: &str) -> String {
    format!(r#"<a:srgbClr val="{hex}"/>"#)
}
