use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::GenericImageView;
use lopdf::encryption::crypt_filters::{Aes256CryptFilter, CryptFilter};
use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use uuid::Uuid;

use crate::error::{AssetError, BinderyError, ValidationError};

use super::{AccessRestrictions, BuiltDocument, PageImage};

/// Fixed page width in PDF points. Page height follows each image's
/// aspect ratio.
pub const PAGE_WIDTH_PT: f64 = 612.0;

/// Builds one encrypted, paginated document from a set of page images.
///
/// Pages are ordered by ascending filename (stable, byte-wise) regardless
/// of input order. The encrypted output is serialized through a private
/// staging file which is removed on every exit path, so a partial or
/// unencrypted artifact can never be observed.
pub fn build_document(
    mut images: Vec<PageImage>,
    restrictions: &AccessRestrictions,
) -> Result<BuiltDocument, BinderyError> {
    if images.is_empty() {
        return Err(ValidationError::EmptyImageSet.into());
    }
    if restrictions.open_password.is_empty() {
        return Err(ValidationError::EmptyOpenPassword.into());
    }

    sort_pages(&mut images);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(images.len());
    for page in &images {
        let page_id = add_page(&mut doc, pages_id, page)?;
        kids.push(page_id.into());
    }

    let page_count = kids.len();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    encrypt_document(&mut doc, restrictions)?;
    let bytes = promote_via_staging(&mut doc, &staging_path())?;

    Ok(BuiltDocument { bytes, page_count })
}

/// The sole page-order rule: ascending byte-wise filename sort. Stable,
/// independent of upload or archive order.
fn sort_pages(images: &mut [PageImage]) {
    images.sort_by(|a, b| a.filename.as_bytes().cmp(b.filename.as_bytes()));
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    page: &PageImage,
) -> Result<ObjectId, BinderyError> {
    let img = image::load_from_memory(&page.bytes).map_err(|e| AssetError::UndecodableImage {
        name: page.filename.clone(),
        source: e,
    })?;

    let (width, height) = img.dimensions();
    let page_height = PAGE_WIDTH_PT * height as f64 / width as f64;

    // JPEG data embeds directly; everything else goes in as raw RGB.
    let is_jpeg = matches!(
        image::guess_format(&page.bytes),
        Ok(image::ImageFormat::Jpeg)
    );
    let image_stream = if is_jpeg {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            page.bytes.clone(),
        )
    } else {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            img.to_rgb8().into_raw(),
        )
    };

    let image_id = doc.add_object(Object::Stream(image_stream));
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! {
            "Im1" => image_id,
        },
    });

    // Draw the image across the full page.
    let content = format!(
        "q\n{:.2} 0 0 {:.2} 0 0 cm\n/Im1 Do\nQ\n",
        PAGE_WIDTH_PT, page_height
    );
    let content_id = doc.add_object(Object::Stream(Stream::new(
        dictionary! {},
        content.into_bytes(),
    )));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            Object::Real(PAGE_WIDTH_PT as f32),
            Object::Real(page_height as f32),
        ],
        "Resources" => resources_id,
        "Contents" => content_id,
    });

    Ok(page_id)
}

/// AES-256 encryption with all permissions denied. The open password is
/// the user password; the owner credential is kept separate.
fn encrypt_document(
    doc: &mut Document,
    restrictions: &AccessRestrictions,
) -> Result<(), BinderyError> {
    let mut crypt_filters: BTreeMap<Vec<u8>, Arc<dyn CryptFilter>> = BTreeMap::new();
    crypt_filters.insert(b"StdCF".to_vec(), Arc::new(Aes256CryptFilter));

    let version = EncryptionVersion::V5 {
        encrypt_metadata: true,
        crypt_filters,
        stream_filter: b"StdCF".to_vec(),
        string_filter: b"StdCF".to_vec(),
        owner_password: restrictions.owner_password.as_str(),
        user_password: restrictions.open_password.as_str(),
        permissions: Permissions::empty(),
    };

    let state =
        EncryptionState::try_from(version).map_err(|e| AssetError::Encryption(e.to_string()))?;
    doc.encrypt(&state)
        .map_err(|e| AssetError::Encryption(e.to_string()))?;
    Ok(())
}

/// Serializes the document through the staging file and reads the
/// finished bytes back. The staging file is removed whether or not
/// serialization succeeds.
fn promote_via_staging(doc: &mut Document, staging: &Path) -> Result<Vec<u8>, BinderyError> {
    let result = doc
        .save(staging)
        .map(|_| ())
        .map_err(|e| AssetError::Assembly(e.to_string()))
        .and_then(|_| {
            std::fs::read(staging).map_err(|e| AssetError::Staging {
                path: staging.to_path_buf(),
                source: e,
            })
        });

    let _ = std::fs::remove_file(staging);

    Ok(result?)
}

fn staging_path() -> PathBuf {
    std::env::temp_dir().join(format!("bindery_stage_{}.pdf", Uuid::new_v4()))
}
