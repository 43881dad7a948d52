use crate::cue::error::SemanticError;
use crate::cue::grammar::{FileItem, FileNode, Line, RawTimeCode, SheetNode, Statement, TrackNode};
use crate::cue::models::{
    Comment, CueFile, CueIndex, CueSheet, CueTrack, FileType, TimeCode, TrackFlags, TrackType,
};

const MAX_TRACK_NUMBER: u32 = 99;

pub type BuildResult<T> = Result<T, SemanticError>;

/// Turns a parse tree into a validated [`CueSheet`].
pub fn build(tree: SheetNode) -> BuildResult<CueSheet> {
    SheetBuilder::default().build(tree)
}

#[derive(Debug, Default)]
struct FreeText {
    title: Option<String>,
    performer: Option<String>,
    comments: Vec<Comment>,
}

#[derive(Debug, Default)]
struct SheetDraft {
    catalog: Option<String>,
    cdtextfile: Option<String>,
    text: FreeText,
    files: Vec<CueFile>,
}

#[derive(Debug)]
struct FileDraft {
    filename: String,
    file_type: FileType,
    text: FreeText,
    tracks: Vec<CueTrack>,
}

#[derive(Debug)]
struct TrackDraft {
    number: u32,
    track_type: TrackType,
    text: FreeText,
    isrc: Option<String>,
    flags: TrackFlags,
    indices: Vec<CueIndex>,
    pregap: Option<TimeCode>,
    postgap: Option<TimeCode>,
}

/// One open level of nesting. Free text always lands in the innermost one.
#[derive(Debug)]
enum Scope {
    Sheet(SheetDraft),
    File(FileDraft),
    Track(TrackDraft),
}

impl Scope {
    fn name(&self) -> &'static str {
        match self {
            Scope::Sheet(_) => "sheet",
            Scope::File(_) => "file",
            Scope::Track(_) => "track",
        }
    }

    fn text(&mut self) -> &mut FreeText {
        match self {
            Scope::Sheet(sheet) => &mut sheet.text,
            Scope::File(file) => &mut file.text,
            Scope::Track(track) => &mut track.text,
        }
    }

    fn apply(&mut self, statement: Line<Statement>) -> BuildResult<()> {
        let scope = self.name();
        let line = statement.line;

        match (self, statement.value) {
            (scope_ref, Statement::Title(title)) => {
                set_once(&mut scope_ref.text().title, title, "TITLE", scope, line)
            }
            (scope_ref, Statement::Performer(performer)) => set_once(
                &mut scope_ref.text().performer,
                performer,
                "PERFORMER",
                scope,
                line,
            ),
            (scope_ref, Statement::Rem(payload)) => {
                scope_ref.text().comments.push(Comment(payload));
                Ok(())
            }
            (Scope::Sheet(sheet), Statement::Catalog(catalog)) => {
                set_once(&mut sheet.catalog, catalog, "CATALOG", scope, line)
            }
            (Scope::Sheet(sheet), Statement::CdTextFile(path)) => {
                set_once(&mut sheet.cdtextfile, path, "CDTEXTFILE", scope, line)
            }
            (Scope::Track(track), Statement::Isrc(isrc)) => {
                set_once(&mut track.isrc, isrc, "ISRC", scope, line)
            }
            (Scope::Track(track), Statement::Flags(flags)) => {
                for flag in flags {
                    track.flags.insert(flag);
                }
                Ok(())
            }
            (Scope::Track(track), Statement::Index { number, position }) => {
                if let Some(previous) = track.indices.last() {
                    if previous.number >= number {
                        return Err(SemanticError::IndexOutOfOrder {
                            track: track.number,
                            previous: previous.number,
                            current: number,
                        });
                    }
                }
                let position = timecode(position, line)?;
                track.indices.push(CueIndex { number, position });
                Ok(())
            }
            (Scope::Track(track), Statement::Pregap(gap)) => {
                let gap = timecode(gap, line)?;
                set_once(&mut track.pregap, gap, "PREGAP", scope, line)
            }
            (Scope::Track(track), Statement::Postgap(gap)) => {
                let gap = timecode(gap, line)?;
                set_once(&mut track.postgap, gap, "POSTGAP", scope, line)
            }
            (_, value) => Err(SemanticError::MisplacedStatement {
                keyword: keyword_of(&value),
                scope,
                line,
            }),
        }
    }
}

#[derive(Debug, Default)]
struct SheetBuilder {
    stack: Vec<Scope>,
    /// Number and line of the most recently opened track, across all files.
    last_track: Option<(u32, usize)>,
}

impl SheetBuilder {
    fn build(mut self, tree: SheetNode) -> BuildResult<CueSheet> {
        self.stack.push(Scope::Sheet(SheetDraft::default()));

        for statement in tree.statements {
            self.apply(statement)?;
        }

        for file in tree.files {
            self.file(file)?;
        }

        match self.stack.pop() {
            Some(Scope::Sheet(sheet)) => Ok(CueSheet {
                catalog: sheet.catalog,
                cdtextfile: sheet.cdtextfile,
                comments: sheet.text.comments,
                performer: sheet.text.performer,
                title: sheet.text.title,
                files: sheet.files,
            }),
            _ => unreachable!("the sheet scope is pushed first and popped last"),
        }
    }

    fn file(&mut self, node: FileNode) -> BuildResult<()> {
        self.stack.push(Scope::File(FileDraft {
            filename: node.name,
            file_type: node.file_type,
            text: FreeText::default(),
            tracks: Vec::new(),
        }));

        for item in node.items {
            match item {
                FileItem::Statement(statement) => self.apply(statement)?,
                FileItem::Track(track) => self.track(track)?,
            }
        }

        let Some(Scope::File(file)) = self.stack.pop() else {
            unreachable!("file scope closed out of order");
        };

        if file.tracks.is_empty() {
            return Err(SemanticError::FileWithoutTracks(file.filename));
        }

        if let Some(Scope::Sheet(sheet)) = self.stack.last_mut() {
            sheet.files.push(CueFile {
                filename: file.filename,
                file_type: file.file_type,
                title: file.text.title,
                performer: file.text.performer,
                comments: file.text.comments,
                tracks: file.tracks,
            });
        }

        Ok(())
    }

    fn track(&mut self, node: TrackNode) -> BuildResult<()> {
        let number = u32::try_from(node.number)
            .ok()
            .filter(|number| (1..=MAX_TRACK_NUMBER).contains(number))
            .ok_or(SemanticError::TrackNumberOutOfRange(node.number))?;

        if let Some((previous, previous_line)) = self.last_track {
            if number == previous {
                return Err(SemanticError::DuplicateTrackNumber {
                    number,
                    first_line: previous_line,
                    second_line: node.line,
                });
            }
            if number < previous {
                return Err(SemanticError::TrackOutOfOrder {
                    previous,
                    current: number,
                });
            }
        }
        self.last_track = Some((number, node.line));

        self.stack.push(Scope::Track(TrackDraft {
            number,
            track_type: node.track_type,
            text: FreeText::default(),
            isrc: None,
            flags: TrackFlags::default(),
            indices: Vec::new(),
            pregap: None,
            postgap: None,
        }));

        for statement in node.statements {
            self.apply(statement)?;
        }

        let Some(Scope::Track(track)) = self.stack.pop() else {
            unreachable!("track scope closed out of order");
        };

        if track.indices.is_empty() {
            return Err(SemanticError::MissingIndex(track.number));
        }

        if let Some(Scope::File(file)) = self.stack.last_mut() {
            file.tracks.push(CueTrack {
                number: track.number,
                track_type: track.track_type,
                title: track.text.title,
                performer: track.text.performer,
                isrc: track.isrc,
                flags: track.flags,
                comments: track.text.comments,
                indices: track.indices,
                pregap: track.pregap,
                postgap: track.postgap,
            });
        }

        Ok(())
    }

    fn apply(&mut self, statement: Line<Statement>) -> BuildResult<()> {
        match self.stack.last_mut() {
            Some(scope) => scope.apply(statement),
            None => unreachable!("statements are only applied while a scope is open"),
        }
    }
}

fn set_once<T>(
    slot: &mut Option<T>,
    value: T,
    field: &'static str,
    scope: &'static str,
    line: usize,
) -> BuildResult<()> {
    if slot.is_some() {
        return Err(SemanticError::DuplicateField { field, scope, line });
    }
    *slot = Some(value);
    Ok(())
}

fn timecode(raw: RawTimeCode, line: usize) -> BuildResult<TimeCode> {
    TimeCode::new(raw.minutes, raw.seconds, raw.frames).ok_or(
        SemanticError::TimeCodeOutOfRange {
            minutes: raw.minutes,
            seconds: raw.seconds,
            frames: raw.frames,
            line,
        },
    )
}

fn keyword_of(statement: &Statement) -> &'static str {
    match statement {
        Statement::Catalog(_) => "CATALOG",
        Statement::CdTextFile(_) => "CDTEXTFILE",
        Statement::Rem(_) => "REM",
        Statement::Performer(_) => "PERFORMER",
        Statement::Title(_) => "TITLE",
        Statement::Isrc(_) => "ISRC",
        Statement::Flags(_) => "FLAGS",
        Statement::Index { .. } => "INDEX",
        Statement::Pregap(_) => "PREGAP",
        Statement::Postgap(_) => "POSTGAP",
    }
}
