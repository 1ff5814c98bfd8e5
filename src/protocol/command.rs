//! Command registry
//!
//! Static mapping from protocol command name to its response decoder.
//! The set of commands is closed and known at build time; dispatch is
//! purely name based.

/// Delimiter-key sets for object-sequence responses.
///
/// The reappearance of one of these keys starts a new record within a
/// response that concatenates several objects without explicit
/// boundaries. Which set applies is a property of the command family,
/// not of the decoder.
const SONGS: &[&str] = &["file"];
const PLAYLISTS: &[&str] = &["playlist"];
const DATABASE: &[&str] = &["file", "directory", "playlist"];
const CHANGES: &[&str] = &["cpos"];
const OUTPUTS: &[&str] = &["outputid"];
const PLUGINS: &[&str] = &["plugin"];
const MESSAGES: &[&str] = &["channel"];
const MOUNTS: &[&str] = &["mount"];
const NEIGHBORS: &[&str] = &["neighbor"];

/// The closed set of response shapes a command can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Lone terminator; any data line is a protocol error
    Nothing,

    /// Exactly one `key: value` pair; anything else folds to "no value"
    Item,

    /// All pairs share one key; yields one value per pair
    List,

    /// Positional colon-delimited pairs, values only
    Playlist,

    /// All pairs aggregated into a single mapping
    Object,

    /// Sequence of mappings split on the given delimiter keys
    Objects(&'static [&'static str]),

    /// Textual headers plus an exact-length raw payload
    Binary,
}

/// A resolved command: its literal wire name and response shape.
///
/// `response` is `None` for fire-and-forget commands that expect no
/// response line at all (`close`, `kill`).
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub response: Option<ResponseKind>,
}

/// Every supported command, grouped as in the protocol documentation.
///
/// Two-word commands carry a literal space; callers may address them
/// with an underscore instead (see [`resolve`]).
#[rustfmt::skip]
const COMMANDS: &[(&str, Option<ResponseKind>)] = {
    use ResponseKind::*;
    &[
        // Querying MPD's status
        ("clearerror",         Some(Nothing)),
        ("currentsong",        Some(Object)),
        ("idle",               Some(List)),
        ("status",             Some(Object)),
        ("stats",              Some(Object)),
        // Playback options
        ("consume",            Some(Nothing)),
        ("crossfade",          Some(Nothing)),
        ("mixrampdb",          Some(Nothing)),
        ("mixrampdelay",       Some(Nothing)),
        ("random",             Some(Nothing)),
        ("repeat",             Some(Nothing)),
        ("setvol",             Some(Nothing)),
        ("getvol",             Some(Object)),
        ("single",             Some(Nothing)),
        ("replay_gain_mode",   Some(Nothing)),
        ("replay_gain_status", Some(Item)),
        ("volume",             Some(Nothing)),
        // Controlling playback
        ("next",               Some(Nothing)),
        ("pause",              Some(Nothing)),
        ("play",               Some(Nothing)),
        ("playid",             Some(Nothing)),
        ("previous",           Some(Nothing)),
        ("seek",               Some(Nothing)),
        ("seekid",             Some(Nothing)),
        ("seekcur",            Some(Nothing)),
        ("stop",               Some(Nothing)),
        // The queue
        ("add",                Some(Nothing)),
        ("addid",              Some(Item)),
        ("clear",              Some(Nothing)),
        ("delete",             Some(Nothing)),
        ("deleteid",           Some(Nothing)),
        ("move",               Some(Nothing)),
        ("moveid",             Some(Nothing)),
        ("playlist",           Some(Playlist)),
        ("playlistfind",       Some(Objects(SONGS))),
        ("playlistid",         Some(Objects(SONGS))),
        ("playlistinfo",       Some(Objects(SONGS))),
        ("playlistsearch",     Some(Objects(SONGS))),
        ("plchanges",          Some(Objects(SONGS))),
        ("plchangesposid",     Some(Objects(CHANGES))),
        ("prio",               Some(Nothing)),
        ("prioid",             Some(Nothing)),
        ("rangeid",            Some(Nothing)),
        ("shuffle",            Some(Nothing)),
        ("swap",               Some(Nothing)),
        ("swapid",             Some(Nothing)),
        ("addtagid",           Some(Nothing)),
        ("cleartagid",         Some(Nothing)),
        // Stored playlists
        ("listplaylist",       Some(List)),
        ("listplaylistinfo",   Some(Objects(SONGS))),
        ("listplaylists",      Some(Objects(PLAYLISTS))),
        ("load",               Some(Nothing)),
        ("playlistadd",        Some(Nothing)),
        ("playlistclear",      Some(Nothing)),
        ("playlistdelete",     Some(Nothing)),
        ("playlistlength",     Some(Object)),
        ("playlistmove",       Some(Nothing)),
        ("rename",             Some(Nothing)),
        ("rm",                 Some(Nothing)),
        ("save",               Some(Nothing)),
        // The music database
        ("albumart",           Some(Binary)),
        ("count",              Some(Object)),
        ("getfingerprint",     Some(Object)),
        ("find",               Some(Objects(SONGS))),
        ("findadd",            Some(Nothing)),
        ("list",               Some(List)),
        ("listall",            Some(Objects(DATABASE))),
        ("listallinfo",        Some(Objects(DATABASE))),
        ("listfiles",          Some(Objects(DATABASE))),
        ("lsinfo",             Some(Objects(DATABASE))),
        ("readcomments",       Some(Object)),
        ("readpicture",        Some(Binary)),
        ("search",             Some(Objects(SONGS))),
        ("searchadd",          Some(Nothing)),
        ("searchaddpl",        Some(Nothing)),
        ("searchcount",        Some(Object)),
        ("update",             Some(Item)),
        ("rescan",             Some(Item)),
        // Mounts and neighbors
        ("mount",              Some(Nothing)),
        ("unmount",            Some(Nothing)),
        ("listmounts",         Some(Objects(MOUNTS))),
        ("listneighbors",      Some(Objects(NEIGHBORS))),
        // Stickers
        ("sticker get",        Some(Item)),
        ("sticker set",        Some(Nothing)),
        ("sticker delete",     Some(Nothing)),
        ("sticker list",       Some(List)),
        ("sticker find",       Some(Objects(SONGS))),
        ("stickernames",       Some(List)),
        // Connection settings
        ("close",              None),
        ("kill",               None),
        ("password",           Some(Nothing)),
        ("ping",               Some(Nothing)),
        ("binarylimit",        Some(Nothing)),
        ("tagtypes",           Some(List)),
        ("tagtypes disable",   Some(Nothing)),
        ("tagtypes enable",    Some(Nothing)),
        ("tagtypes clear",     Some(Nothing)),
        ("tagtypes all",       Some(Nothing)),
        // Partition commands
        ("partition",          Some(Nothing)),
        ("listpartitions",     Some(List)),
        ("newpartition",       Some(Nothing)),
        ("delpartition",       Some(Nothing)),
        ("moveoutput",         Some(Nothing)),
        // Audio output devices
        ("disableoutput",      Some(Nothing)),
        ("enableoutput",       Some(Nothing)),
        ("toggleoutput",       Some(Nothing)),
        ("outputs",            Some(Objects(OUTPUTS))),
        ("outputset",          Some(Nothing)),
        // Reflection
        ("config",             Some(Object)),
        ("commands",           Some(List)),
        ("notcommands",        Some(List)),
        ("urlhandlers",        Some(List)),
        ("decoders",           Some(Objects(PLUGINS))),
        // Client to client
        ("subscribe",          Some(Nothing)),
        ("unsubscribe",        Some(Nothing)),
        ("channels",           Some(List)),
        ("readmessages",       Some(Objects(MESSAGES))),
        ("sendmessage",        Some(Nothing)),
    ]
};

/// Look up a command by its exact wire name
pub fn lookup(command: &str) -> Option<CommandSpec> {
    COMMANDS
        .iter()
        .find(|(name, _)| *name == command)
        .map(|&(name, response)| CommandSpec { name, response })
}

/// Resolve a caller-facing command name.
///
/// Tries the verbatim name first, then the underscore-to-space
/// translation so two-word commands are addressable either way
/// (`sticker_get` and `sticker get` are equivalent).
pub fn resolve(command: &str) -> Option<CommandSpec> {
    if let Some(spec) = lookup(command) {
        return Some(spec);
    }
    if command.contains('_') {
        return lookup(&command.replace('_', " "));
    }
    None
}
