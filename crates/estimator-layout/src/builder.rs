//! Layout builder
//!
//! Synthesizes the objects, keys and values the target store would write for
//! directories, symlinks and files.
//!
//! A file becomes its own object holding the metadata key `0` followed by one
//! integer key per group of identical chunks:
//!
//! ```text
//! File (1.5 MB, 1 MiB chunks, 128 KiB I/O)
//! ├── dkey 0: metadata     3 x 64 B
//! ├── dkey 1: full chunk   8 x 128 KiB
//! └── dkey 2: remainder    3 x 128 KiB + 1 x 58208 B
//! ```
//!
//! With erasure coding every chunk group is followed by its parity key and
//! the stripes are counted in [`EcStats`].

use crate::ec::EcStats;
use crate::types::{Container, Key, Object, ObjectId, Overhead, Value, ValueType, checked, overflow};
use estimator_common::{LayoutConfig, Result};
use serde::Serialize;
use tracing::debug;

/// Result of one build pass
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Layout {
    /// Objects in creation order
    pub container: Container,
    /// EC totals across every file in the container
    pub ec_totals: EcStats,
}

/// Keys of one file under construction
struct FileKeys {
    object: Object,
    next_index: u64,
    stats: EcStats,
}

impl FileKeys {
    /// Append an integer key standing for `count` identical chunks
    fn push_chunk(&mut self, attribute: Key, count: u64) -> Result<()> {
        let key = Key::distribution(self.next_index, Overhead::User)
            .with_count(count)?
            .with_key(attribute);
        self.next_index += 1;
        self.object.push_key(key);
        Ok(())
    }
}

/// Builds the layout for one pass
///
/// The builder owns the container and the session EC totals. Templates for
/// the inode attribute and the file metadata key are built once from the
/// configuration and cloned into every entry.
#[derive(Debug)]
pub struct LayoutBuilder {
    config: LayoutConfig,
    inode: Key,
    file_meta: Key,
    container: Container,
    ec_totals: EcStats,
}

impl LayoutBuilder {
    /// Create a builder for the given configuration
    pub fn new(config: LayoutConfig) -> Result<Self> {
        config.validate()?;

        let inode = Key::attribute(config.inode.key.clone(), Overhead::Meta, ValueType::Array)
            .with_value(Value::single(config.inode.size));
        let file_meta = Key::distribution(0_u64, Overhead::Meta).with_key(
            Key::attribute(0_u64, Overhead::Meta, ValueType::Single).with_value(Value::new(
                config.file_meta.records,
                config.file_meta.size,
            )?),
        );

        Ok(Self {
            config,
            inode,
            file_meta,
            container: Container::new(),
            ec_totals: EcStats::default(),
        })
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Get the container built so far
    #[must_use]
    pub const fn container(&self) -> &Container {
        &self.container
    }

    /// Snapshot of the EC totals
    #[must_use]
    pub const fn ec_totals(&self) -> EcStats {
        self.ec_totals
    }

    /// Clear the container and EC totals before a new pass
    pub fn reset(&mut self) {
        self.container.clear();
        self.ec_totals = EcStats::default();
    }

    /// Finish the pass
    #[must_use]
    pub fn into_layout(self) -> Layout {
        Layout {
            container: self.container,
            ec_totals: self.ec_totals,
        }
    }

    /// Append an empty object
    pub fn create_object(&mut self) -> ObjectId {
        self.container.push(Object::default())
    }

    /// Append an empty object standing for `count` identical objects
    pub fn create_object_with_count(&mut self, count: u64) -> Result<ObjectId> {
        Ok(self.container.push(Object::with_count(count)?))
    }

    /// Remove an object. Ids after it are invalidated.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<()> {
        self.container.remove(id).map(|_| ())
    }

    /// Add `repeat_count` symlinks of `link_size` bytes to a directory object
    pub fn create_symlink(
        &mut self,
        id: ObjectId,
        name: &str,
        link_size: u64,
        repeat_count: u64,
    ) -> Result<()> {
        let key = Key::distribution(name, Overhead::Meta)
            .with_count(repeat_count)?
            .with_key(self.inode.clone().with_value(Value::single(link_size)));
        self.container.append_key(id, key)
    }

    /// Add `repeat_count` entries pointing at the inode template
    pub fn create_directory_entry(
        &mut self,
        id: ObjectId,
        name: &str,
        repeat_count: u64,
    ) -> Result<()> {
        let key = Key::distribution(name, Overhead::Meta)
            .with_count(repeat_count)?
            .with_key(self.inode.clone());
        self.container.append_key(id, key)
    }

    /// Mark an unreadable directory with a single placeholder entry
    pub fn create_dummy_entry(&mut self, id: ObjectId, name: &str) -> Result<()> {
        self.create_directory_entry(id, name, 1)
    }

    /// Build `repeat_count` identical files and append them as one object
    ///
    /// Returns the new object id and the EC stats of all `repeat_count` files,
    /// which are also folded into the session totals. On error neither the
    /// container nor the totals change.
    pub fn create_file_layout(
        &mut self,
        file_size: u64,
        repeat_count: u64,
    ) -> Result<(ObjectId, EcStats)> {
        let (object, stats) = self.file_layout(file_size, repeat_count)?;

        if self.config.ec_enabled() {
            let summary = stats.summarize(self.config.cell_count, self.config.parity_count);
            debug!("{summary}");
            self.ec_totals.add(&stats)?;
        }

        Ok((self.container.push(object), stats))
    }

    /// Build the object for `repeat_count` identical files without attaching it
    pub fn file_layout(&self, file_size: u64, repeat_count: u64) -> Result<(Object, EcStats)> {
        self.config.validate()?;
        debug!("adding {} file(s) of size {}", repeat_count, file_size);

        checked(file_size.checked_mul(repeat_count), "file bytes")?;
        let mut object = Object::with_count(repeat_count)?;
        object.push_key(self.file_meta.clone());

        let mut file = FileKeys {
            object,
            next_index: 1,
            stats: EcStats::default(),
        };

        let chunk_size = self.config.chunk_size;
        let chunks = file_size / chunk_size;
        let remainder = file_size % chunk_size;

        if self.config.ec_enabled() {
            self.add_ec_chunks(&mut file, chunks)?;
            self.add_ec_remainder(&mut file, remainder)?;
        } else {
            if chunks > 0 {
                debug!("adding {} chunk(s) of size {}", chunks, chunk_size);
                file.push_chunk(self.io_attribute(chunk_size)?, chunks)?;
            }
            if remainder > 0 {
                debug!("adding 1 chunk of size {}", remainder);
                file.push_chunk(self.io_attribute(remainder)?, 1)?;
            }
        }

        let FileKeys {
            object, mut stats, ..
        } = file;
        stats.scale(repeat_count)?;
        object.footprint()?;
        Ok((object, stats))
    }

    /// Array attribute holding `size` bytes cut into I/O units
    fn io_attribute(&self, size: u64) -> Result<Key> {
        let io_size = self.config.io_size;
        let units = size / io_size;
        let remainder = size % io_size;

        let mut attribute = Key::attribute(0_u64, Overhead::User, ValueType::Array);
        if units > 0 {
            attribute = attribute.with_value(Value::new(units, io_size)?);
        }
        if remainder > 0 {
            attribute = attribute.with_value(Value::single(remainder));
        }
        Ok(attribute)
    }

    /// Full chunks: one data key and one parity key for the whole group
    fn add_ec_chunks(&self, file: &mut FileKeys, chunks: u64) -> Result<()> {
        if chunks == 0 {
            return Ok(());
        }

        let stripe_size = self.config.stripe_size;
        let cells = u64::from(self.config.cell_count);
        let parity = u64::from(self.config.parity_count);

        let data_count = cells.checked_mul(chunks).ok_or_else(|| overflow("data cells"))?;
        let parity_count = parity
            .checked_mul(chunks)
            .ok_or_else(|| overflow("parity cells"))?;

        debug!("adding cell size {} x {}", stripe_size, data_count);
        file.push_chunk(self.io_attribute(stripe_size)?, data_count)?;
        file.push_chunk(self.io_attribute(stripe_size)?, parity_count)?;

        let mut group =
            EcStats::stripe(self.config.cell_count, self.config.parity_count, stripe_size)?;
        group.file_size_total = self.config.chunk_size;
        group.scale(chunks)?;
        file.stats.add(&group)
    }

    /// Remainder chunk: full stripes, then the partial stripe, each with parity
    fn add_ec_remainder(&self, file: &mut FileKeys, remainder: u64) -> Result<()> {
        if remainder == 0 {
            return Ok(());
        }

        let stripe_size = self.config.stripe_size;
        let parity = u64::from(self.config.parity_count);
        let stripes = remainder / stripe_size;
        let partial = remainder % stripe_size;
        let stripe =
            EcStats::stripe(self.config.cell_count, self.config.parity_count, stripe_size)?;

        if stripes > 0 {
            debug!("adding {} remainder stripe(s) of size {}", stripes, stripe_size);
            let parity_count = parity
                .checked_mul(stripes)
                .ok_or_else(|| overflow("parity cells"))?;
            file.push_chunk(self.io_attribute(stripe_size)?, stripes)?;
            file.push_chunk(self.io_attribute(stripe_size)?, parity_count)?;

            let mut group = stripe;
            group.scale(stripes)?;
            file.stats.add(&group)?;
        }

        if partial > 0 {
            debug!("adding partial stripe of size {}", partial);
            file.push_chunk(self.io_attribute(partial)?, 1)?;
            file.push_chunk(self.io_attribute(stripe_size)?, parity)?;
            file.stats.add(&stripe)?;
        }

        file.stats.add(&EcStats {
            file_size_total: remainder,
            ..EcStats::default()
        })
    }
}
