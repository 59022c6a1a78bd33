pub(super) const ROOT_LONG_ABOUT: &str = "\
Detect added, modified and removed files in a directory tree

Treediff records a manifest of a directory tree (every directory, and a CRC-32
fingerprint of every tracked file) and later compares the tree against it to
report exactly what changed in between. Useful for incremental sync and
deployment tooling that only wants to touch what moved.

CORE CONCEPTS:

  Manifest:
    A TOML file (.treediff in the scanned directory unless --manifest says
    otherwise) mirroring the directory hierarchy. Each file entry carries the
    root-relative path and the fingerprint seen on the last update.

  Change report:
    Added, modified and removed files, added and removed directories. A file
    counts as modified when its content fingerprint differs; timestamps are
    ignored.

TYPICAL WORKFLOW:

  1. Record the tree once:
     $ treediff -C /path/to/tree init

  2. Later, see what changed:
     $ treediff -C /path/to/tree status

  3. Accept the changes:
     $ treediff -C /path/to/tree update

SCAN OPTIONS (init, status, update):

  --ext <EXT>          Track only files with these extensions (repeatable).
                       Directories are always walked.
  --max-depth <N>      Do not enter directories more than N levels below the
                       root. With 0, only entries directly in the root are
                       examined.
  --coarse             A directory that appeared or disappeared is reported as
                       one change; its contents are not listed.
  --force-add-all      Report everything as added regardless of the manifest.
  --config <FILE>      Read the above from a TOML file. Keys:
                       file_extensions, max_recurse_depth,
                       skip_directory_contents_on_add_remove, force_add_all.

GLOBAL OPTIONS:

  -C <DIRECTORY>
    Change to directory before operating (like git -C or make -C).

  -v, --verbose / --log-level <LEVEL>
    Log to stderr. Both take precedence over RUST_LOG.
";

pub(super) const INIT_LONG_ABOUT: &str = "\
Record the current state of the tree for the first time

Scans the whole tree, fingerprints every tracked file and writes the manifest.
Fails if a manifest already exists; use 'update' from then on.

EXAMPLES:

  $ treediff init
  $ treediff init --ext .html --ext .css
  $ treediff init --dry-run
";

pub(super) const STATUS_LONG_ABOUT: &str = "\
Show what changed since the manifest was last written

Prints one line per change and never writes anything:

  A  path      file added
  M  path      file content changed
  R  path      file removed
  A  path/     directory added
  R  path/     directory removed

When there are changes, the output ends with a digest identifying this exact
change set. Pass it to 'update --digest' to record precisely what was reviewed.

Without a manifest every entry is reported as added.

EXIT STATUS:

  0    no changes
  1    changes found
  255  error
";

pub(super) const UPDATE_LONG_ABOUT: &str = "\
Record the current state of the tree in the manifest

Reconciles the tree against the manifest and writes the result back. The file
is only rewritten when something changed.

Fails if there is no manifest yet, unless --allow-init is given.

SAFE UPDATE WORKFLOW:

  $ treediff status > review.txt
  $ DIGEST=$(grep '^Digest:' review.txt | cut -d' ' -f2)
  $ treediff update --digest $DIGEST

If the tree changed between 'status' and 'update', the digests differ and
nothing is written.
";
