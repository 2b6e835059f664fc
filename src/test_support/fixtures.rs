//! Test fixtures for common test scenarios.
//!
//! [`ModuleImage`] writes minimal but valid PE32 images carrying CLI
//! metadata, so the real reader can be exercised without checked-in
//! binaries. Archive helpers build companion packages in memory.

use std::io::Write;

/// Builder for a minimal CLI module image.
///
/// The image has one `.text` section holding the CLI header followed by a
/// metadata root with the `#~`, `#Strings`, `#US`, `#GUID` and `#Blob`
/// streams. Only the Module, TypeRef, TypeDef, Assembly and AssemblyRef
/// tables are emitted, all with 2-byte indexes.
#[derive(Debug, Clone)]
pub struct ModuleImage {
    name: String,
    references: Vec<(String, [u16; 4])>,
    type_refs: Vec<(String, String)>,
    type_defs: Vec<(String, String, Option<(String, String)>, u32)>,
}

impl ModuleImage {
    /// Start an image for the module `name`.
    pub fn new(name: impl Into<String>) -> Self {
        ModuleImage {
            name: name.into(),
            references: Vec::new(),
            type_refs: Vec::new(),
            type_defs: Vec::new(),
        }
    }

    /// Declare an assembly reference.
    pub fn reference(mut self, name: &str, version: [u16; 4]) -> Self {
        self.references.push((name.to_string(), version));
        self
    }

    /// Declare a reference to an external type.
    pub fn type_ref(mut self, namespace: &str, name: &str) -> Self {
        self.type_refs.push((namespace.to_string(), name.to_string()));
        self
    }

    /// Define a type. `base` must name a declared type ref or an earlier
    /// type def.
    pub fn type_def(mut self, namespace: &str, name: &str, base: Option<(&str, &str)>, flags: u32) -> Self {
        self.type_defs.push((
            namespace.to_string(),
            name.to_string(),
            base.map(|(ns, n)| (ns.to_string(), n.to_string())),
            flags,
        ));
        self
    }

    /// A module defining one concrete plugin type.
    pub fn plugin(name: &str) -> Self {
        ModuleImage::new(name)
            .type_ref("BepInEx", "BaseUnityPlugin")
            .type_def(name, "Plugin", Some(("BepInEx", "BaseUnityPlugin")), 0x0010_0001)
    }

    /// Serialize the image.
    pub fn build(&self) -> Vec<u8> {
        let mut strings = StringHeap::new();
        let module_name = strings.add(&format!("{}.dll", self.name));
        let assembly_name = strings.add(&self.name);

        let mut tables = Vec::new();

        // Module: generation, name, mvid (#GUID index 1), encid, encbaseid
        push_u16(&mut tables, 0);
        push_u16(&mut tables, module_name);
        push_u16(&mut tables, 1);
        push_u16(&mut tables, 0);
        push_u16(&mut tables, 0);

        // TypeRef
        for (namespace, name) in &self.type_refs {
            push_u16(&mut tables, 0);
            push_u16(&mut tables, strings.add(name));
            push_u16(&mut tables, strings.add(namespace));
        }

        // TypeDef, starting with the <Module> pseudo type
        let module_type = strings.add("<Module>");
        for (flags, name, namespace, extends) in std::iter::once((0u32, module_type, 0u16, 0u16))
            .chain(self.type_defs.iter().map(|(namespace, name, base, flags)| {
                (
                    *flags,
                    strings.add(name),
                    strings.add(namespace),
                    self.encode_base(base.as_ref()),
                )
            }))
            .collect::<Vec<_>>()
        {
            push_u32(&mut tables, flags);
            push_u16(&mut tables, name);
            push_u16(&mut tables, namespace);
            push_u16(&mut tables, extends);
            push_u16(&mut tables, 1);
            push_u16(&mut tables, 1);
        }

        // Assembly: SHA1, version 1.0.0.0, no public key, neutral culture
        push_u32(&mut tables, 0x8004);
        for part in [1u16, 0, 0, 0] {
            push_u16(&mut tables, part);
        }
        push_u32(&mut tables, 0);
        push_u16(&mut tables, 0);
        push_u16(&mut tables, assembly_name);
        push_u16(&mut tables, 0);

        // AssemblyRef
        for (name, version) in &self.references {
            for part in version {
                push_u16(&mut tables, *part);
            }
            push_u32(&mut tables, 0);
            push_u16(&mut tables, 0);
            push_u16(&mut tables, strings.add(name));
            push_u16(&mut tables, 0);
            push_u16(&mut tables, 0);
        }

        let mut valid: u64 = (1 << 0x00) | (1 << 0x02) | (1 << 0x20);
        let mut counts = vec![1u32];
        if !self.type_refs.is_empty() {
            valid |= 1 << 0x01;
            counts.push(self.type_refs.len() as u32);
        }
        counts.push(self.type_defs.len() as u32 + 1);
        counts.push(1);
        if !self.references.is_empty() {
            valid |= 1 << 0x23;
            counts.push(self.references.len() as u32);
        }

        let mut table_stream = Vec::new();
        push_u32(&mut table_stream, 0);
        table_stream.push(2);
        table_stream.push(0);
        table_stream.push(0);
        table_stream.push(1);
        push_u64(&mut table_stream, valid);
        push_u64(&mut table_stream, 0);
        for count in counts {
            push_u32(&mut table_stream, count);
        }
        table_stream.extend_from_slice(&tables);
        pad4(&mut table_stream);

        let mut string_stream = strings.into_bytes();
        pad4(&mut string_stream);

        let mut guid_stream = Vec::new();
        for byte in 0..16u8 {
            guid_stream.push(byte.wrapping_mul(17).wrapping_add(self.name.len() as u8));
        }

        let streams: [(&[u8], Vec<u8>); 5] = [
            (b"#~\0\0", table_stream),
            (b"#Strings\0\0\0\0", string_stream),
            (b"#US\0", vec![0; 4]),
            (b"#GUID\0\0\0", guid_stream),
            (b"#Blob\0\0\0", vec![0; 4]),
        ];

        // Metadata root: 16-byte signature block, version, flags and
        // stream count, then one (offset, size, name) header per stream.
        let version = b"v4.0.30319\0\0";
        let headers_len = 16
            + version.len()
            + 4
            + streams.iter().map(|(name, _)| 8 + name.len()).sum::<usize>();
        let mut root = Vec::new();
        push_u32(&mut root, 0x424A_5342);
        push_u16(&mut root, 1);
        push_u16(&mut root, 1);
        push_u32(&mut root, 0);
        push_u32(&mut root, version.len() as u32);
        root.extend_from_slice(version);
        push_u16(&mut root, 0);
        push_u16(&mut root, streams.len() as u16);
        let mut offset = headers_len;
        for (name, body) in &streams {
            push_u32(&mut root, offset as u32);
            push_u32(&mut root, body.len() as u32);
            root.extend_from_slice(name);
            offset += body.len();
        }
        debug_assert_eq!(root.len(), headers_len);
        for (_, body) in &streams {
            root.extend_from_slice(body);
        }

        let section_rva: u32 = 0x2000;
        let section_offset: usize = 0x200;
        let cli_size: u32 = 72;
        let metadata_rva = section_rva + cli_size;

        let mut section = Vec::new();
        push_u32(&mut section, cli_size);
        push_u16(&mut section, 2);
        push_u16(&mut section, 5);
        push_u32(&mut section, metadata_rva);
        push_u32(&mut section, root.len() as u32);
        push_u32(&mut section, 1);
        section.resize(cli_size as usize, 0);
        section.extend_from_slice(&root);
        section.resize(section.len().next_multiple_of(0x200), 0);
        let section_len = section.len() as u32;

        let mut image = vec![0u8; section_offset];
        image[0] = b'M';
        image[1] = b'Z';
        image[0x3C..0x40].copy_from_slice(&0x80u32.to_le_bytes());

        let pe = 0x80;
        image[pe..pe + 4].copy_from_slice(b"PE\0\0");
        let coff = pe + 4;
        image[coff..coff + 2].copy_from_slice(&0x14Cu16.to_le_bytes());
        image[coff + 2..coff + 4].copy_from_slice(&1u16.to_le_bytes());
        image[coff + 16..coff + 18].copy_from_slice(&224u16.to_le_bytes());
        image[coff + 18..coff + 20].copy_from_slice(&0x2102u16.to_le_bytes());

        let optional = coff + 20;
        let size_of_image = section_rva + section_len.next_multiple_of(0x2000);
        image[optional..optional + 2].copy_from_slice(&0x10Bu16.to_le_bytes());
        image[optional + 28..optional + 32].copy_from_slice(&0x0040_0000u32.to_le_bytes());
        image[optional + 32..optional + 36].copy_from_slice(&0x2000u32.to_le_bytes());
        image[optional + 36..optional + 40].copy_from_slice(&0x200u32.to_le_bytes());
        image[optional + 40..optional + 42].copy_from_slice(&4u16.to_le_bytes());
        image[optional + 48..optional + 50].copy_from_slice(&4u16.to_le_bytes());
        image[optional + 56..optional + 60].copy_from_slice(&size_of_image.to_le_bytes());
        image[optional + 60..optional + 64].copy_from_slice(&(section_offset as u32).to_le_bytes());
        image[optional + 68..optional + 70].copy_from_slice(&3u16.to_le_bytes());
        image[optional + 92..optional + 96].copy_from_slice(&16u32.to_le_bytes());
        let cli_directory = optional + 96 + 14 * 8;
        image[cli_directory..cli_directory + 4].copy_from_slice(&section_rva.to_le_bytes());
        image[cli_directory + 4..cli_directory + 8].copy_from_slice(&cli_size.to_le_bytes());

        let header = optional + 224;
        image[header..header + 5].copy_from_slice(b".text");
        image[header + 8..header + 12].copy_from_slice(&section_len.to_le_bytes());
        image[header + 12..header + 16].copy_from_slice(&section_rva.to_le_bytes());
        image[header + 16..header + 20].copy_from_slice(&section_len.to_le_bytes());
        image[header + 20..header + 24].copy_from_slice(&(section_offset as u32).to_le_bytes());
        // CNT_CODE | MEM_EXECUTE | MEM_READ
        image[header + 36..header + 40].copy_from_slice(&0x6000_0020u32.to_le_bytes());

        image.extend_from_slice(&section);
        image
    }

    /// Encode a base type as a TypeDefOrRef coded index.
    fn encode_base(&self, base: Option<&(String, String)>) -> u16 {
        let Some(base) = base else {
            return 0;
        };
        if let Some(i) = self.type_refs.iter().position(|r| r == base) {
            return (((i + 1) << 2) | 1) as u16;
        }
        if let Some(i) = self
            .type_defs
            .iter()
            .position(|(ns, n, _, _)| (ns, n) == (&base.0, &base.1))
        {
            // Row 1 is <Module>
            return ((i + 2) << 2) as u16;
        }
        panic!("base type {}.{} is not declared", base.0, base.1);
    }
}

/// Deduplicating #Strings heap.
struct StringHeap {
    bytes: Vec<u8>,
    offsets: Vec<(String, u16)>,
}

impl StringHeap {
    fn new() -> Self {
        StringHeap {
            bytes: vec![0],
            offsets: Vec::new(),
        }
    }

    fn add(&mut self, s: &str) -> u16 {
        if s.is_empty() {
            return 0;
        }
        if let Some((_, offset)) = self.offsets.iter().find(|(existing, _)| existing == s) {
            return *offset;
        }
        let offset = self.bytes.len() as u16;
        self.bytes.extend_from_slice(s.as_bytes());
        self.bytes.push(0);
        self.offsets.push((s.to_string(), offset));
        offset
    }

    fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

fn push_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn push_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn pad4(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

/// Build a zip archive from `(path, contents)` pairs. Paths ending in `/`
/// become directory entries.
pub fn zip_archive(files: &[(&str, &str)]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (path, contents) in files {
            if path.ends_with('/') {
                zip.add_directory(*path, options).unwrap();
            } else {
                zip.start_file(*path, options).unwrap();
                zip.write_all(contents.as_bytes()).unwrap();
            }
        }
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

/// Build a gzip-compressed tarball from `(path, contents)` pairs.
pub fn tar_gz_archive(files: &[(&str, &str)]) -> Vec<u8> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let mut data = Vec::new();
    {
        let encoder = GzEncoder::new(&mut data, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_path(path).unwrap();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, contents.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_has_pe_signature() {
        let image = ModuleImage::plugin("Abyss.Core").build();
        assert_eq!(&image[..2], b"MZ");
        assert_eq!(&image[0x80..0x84], b"PE\0\0");
    }

    #[test]
    fn test_string_heap_deduplicates() {
        let mut heap = StringHeap::new();
        let a = heap.add("Abyss");
        let b = heap.add("Abyss");
        assert_eq!(a, b);
        assert_eq!(heap.add(""), 0);
    }
}
